use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cardwright::{BatchReport, Config, EpisodeRecord, Maintainer};

#[derive(Parser, Debug)]
#[command(name = "cardwright", version)]
struct Cli {
    /// Configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// Log filter used when `RUST_LOG` is unset (e.g. `info`, `cardwright=debug`).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create missing cards under each show's primary profile.
    Create(TargetArgs),
    /// Create missing cards for every profile variant under the archive root.
    Archive(TargetArgs),
    /// List the profile variants of a show.
    Profiles(ShowArgs),
    /// List episodes whose title the show's font cannot draw.
    CheckFont(ShowArgs),
    /// Append an episode row to a show's data file.
    AddEpisode(AddEpisodeArgs),
    /// Create a show's data file with only the header row.
    InitData(ShowArgs),
}

#[derive(Parser, Debug)]
struct TargetArgs {
    /// Only this show (name or "Name (Year)"). Defaults to every show.
    #[arg(long)]
    show: Option<String>,
}

#[derive(Parser, Debug)]
struct ShowArgs {
    /// Show name or "Name (Year)".
    #[arg(long)]
    show: String,
}

#[derive(Parser, Debug)]
struct AddEpisodeArgs {
    /// Show name or "Name (Year)".
    #[arg(long)]
    show: String,

    /// Season number, 0 for specials.
    #[arg(long)]
    season: u32,

    /// Episode number.
    #[arg(long)]
    episode: u32,

    /// Upper title line.
    #[arg(long, default_value = "")]
    top: String,

    /// Lower title line.
    #[arg(long)]
    bottom: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = Config::from_path(&cli.config)?;
    let maintainer = Maintainer::new(config)?;
    for rejected in maintainer.rejected() {
        eprintln!("skipped show {}: {}", rejected.label, rejected.error);
    }

    match cli.cmd {
        Command::Create(args) => finish(maintainer.create_missing(args.show.as_deref())),
        Command::Archive(args) => finish(maintainer.archive(args.show.as_deref())?),
        Command::Profiles(args) => {
            for variant in maintainer.profiles(&args.show)? {
                println!("{variant}");
            }
            Ok(())
        }
        Command::CheckFont(args) => cmd_check_font(&maintainer, &args.show),
        Command::AddEpisode(args) => {
            let record = EpisodeRecord {
                title_top: args.top,
                title_bottom: args.bottom,
                season: args.season,
                episode: args.episode,
            };
            maintainer.add_episode(&args.show, &record)?;
            eprintln!(
                "added S{:02}E{:02} to '{}'",
                record.season, record.episode, args.show
            );
            Ok(())
        }
        Command::InitData(args) => {
            maintainer.init_data(&args.show)?;
            if let Some(show) = maintainer.show(&args.show) {
                eprintln!("wrote {}", show.store().path().display());
            }
            Ok(())
        }
    }
}

fn init_logging(default_level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)
            .with_context(|| format!("invalid --log-level '{default_level}'"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn cmd_check_font(maintainer: &Maintainer, show: &str) -> anyhow::Result<()> {
    let issues = maintainer.check_fonts(show)?;
    if issues.is_empty() {
        eprintln!("every episode of '{show}' is renderable");
        return Ok(());
    }
    for issue in &issues {
        let chars: String = issue.missing.iter().collect();
        println!("S{:02}E{:02}\t{chars}", issue.season, issue.episode);
    }
    anyhow::bail!("{} episode(s) of '{show}' use characters the font lacks", issues.len())
}

fn finish(report: BatchReport) -> anyhow::Result<()> {
    for entry in &report.shows {
        match &entry.result {
            Ok(stats) => println!(
                "{} [{}]: created {}, existing {}, missing source {}, failed {}",
                entry.show,
                entry.profile,
                stats.created,
                stats.skipped_existing,
                stats.skipped_missing_source,
                stats.failed()
            ),
            Err(e) => println!("{} [{}]: {e}", entry.show, entry.profile),
        }
    }
    for name in &report.not_found {
        println!("{name}: no such show");
    }

    let totals = report.totals();
    eprintln!(
        "created {} card(s), {} already present, {} missing source, {} failed",
        totals.created,
        totals.skipped_existing,
        totals.skipped_missing_source,
        totals.failed()
    );
    if !report.is_clean() {
        anyhow::bail!("maintenance finished with errors");
    }
    Ok(())
}
