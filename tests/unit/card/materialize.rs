use super::*;
use crate::card::style::StandardStyle;
use crate::config::font::FontOverride;
use crate::config::settings::{Preferences, ShowConfig};
use crate::data::store::EpisodeDataStore;
use crate::stub_executor::StubExecutor;
use crate::synthetic_font;

struct Fixture {
    root: PathBuf,
    source: PathBuf,
    media: PathBuf,
}

impl Fixture {
    fn new(name: &str) -> Self {
        let root = PathBuf::from("target").join("unit_materialize").join(name);
        let _ = std::fs::remove_dir_all(&root);
        let source = root.join("source");
        let media = root.join("media");
        std::fs::create_dir_all(&source).unwrap();
        Self {
            root,
            source,
            media,
        }
    }

    fn still(&self, season: u32, episode: u32) {
        std::fs::write(self.source.join(format!("s{season}e{episode}.jpg")), b"jpg").unwrap();
    }

    fn show(&self, records: &[EpisodeRecord], edit: impl FnOnce(&mut ShowConfig)) -> Show {
        let data = self.root.join("data.tsv");
        let store = EpisodeDataStore::new(&data);
        store.create().unwrap();
        for r in records {
            store.append(r).unwrap();
        }

        let mut cfg = ShowConfig::new("Andor", 2022, &self.media);
        cfg.source_dir = Some(self.source.clone());
        cfg.data_file = Some(data);
        edit(&mut cfg);
        let mut show = Show::new(cfg, &Preferences::new(&self.root)).unwrap();
        show.load().unwrap();
        show
    }
}

fn materializer(executor: Arc<StubExecutor>) -> CardMaterializer {
    CardMaterializer::new(
        Arc::new(StandardStyle::default()),
        executor,
        Arc::new(FontCache::new()),
        MaterializerOpts {
            threads: Some(2),
            ..MaterializerOpts::default()
        },
    )
    .unwrap()
}

#[test]
fn plan_puts_season_zero_under_specials() {
    let fx = Fixture::new("plan_specials");
    let show = fx.show(&[], |_| {});
    let m = materializer(Arc::new(StubExecutor::default()));

    let task = m.plan(&EpisodeRecord::new("", "Extra", 0, 3), &show);
    assert_eq!(task.input, fx.source.join("s0e3.jpg"));
    assert!(task.output.ends_with("Specials/Andor (2022) - S00E03.jpg"));
    assert!(!task.already_exists);

    let task = m.plan(&EpisodeRecord::new("", "Extra", 0, 11), &show);
    assert_eq!(task.output.parent(), Some(fx.media.join("Specials").as_path()));
}

#[test]
fn plan_uses_season_folders() {
    let fx = Fixture::new("plan_season");
    let show = fx.show(&[], |_| {});
    let m = materializer(Arc::new(StubExecutor::default()));
    let task = m.plan(&EpisodeRecord::new("", "Aldhani", 1, 6), &show);
    assert_eq!(
        task.output,
        fx.media.join("Season 1").join("Andor (2022) - S01E06.jpg")
    );
    assert_eq!(task.text.lines, vec!["ALDHANI".to_string()]);
}

#[test]
fn existing_output_is_skipped_without_rendering() {
    let fx = Fixture::new("existing");
    let show = fx.show(&[], |_| {});
    fx.still(1, 1);
    let exec = Arc::new(StubExecutor::default());
    let m = materializer(Arc::clone(&exec));

    let task = m.plan(&EpisodeRecord::new("", "Kassa", 1, 1), &show);
    ensure_parent_dir(&task.output).unwrap();
    std::fs::write(&task.output, b"old").unwrap();

    assert_eq!(m.create(&task).unwrap(), CardOutcome::AlreadyExists);
    assert_eq!(exec.calls(), 0);
    assert_eq!(std::fs::read(&task.output).unwrap(), b"old");
}

#[test]
fn missing_source_is_skipped_without_rendering() {
    let fx = Fixture::new("missing_source");
    let show = fx.show(&[], |_| {});
    let exec = Arc::new(StubExecutor::default());
    let m = materializer(Arc::clone(&exec));

    let task = m.plan(&EpisodeRecord::new("", "That Would Be Me", 1, 2), &show);
    assert_eq!(m.create(&task).unwrap(), CardOutcome::MissingSource);
    assert_eq!(exec.calls(), 0);
    assert!(!task.output.exists());
}

#[test]
fn successful_render_moves_scratch_into_place() {
    let fx = Fixture::new("created");
    let show = fx.show(&[], |_| {});
    fx.still(1, 3);
    let exec = Arc::new(StubExecutor::default());
    let m = materializer(Arc::clone(&exec));

    let task = m.plan(&EpisodeRecord::new("", "Reckoning", 1, 3), &show);
    assert_eq!(m.create(&task).unwrap(), CardOutcome::Created);
    assert_eq!(exec.calls(), 1);
    assert_eq!(std::fs::read(&task.output).unwrap(), b"card");
    assert!(!scratch_path(&task.output).exists());
}

#[test]
fn failed_render_leaves_nothing_behind() {
    let fx = Fixture::new("failed");
    let show = fx.show(&[], |_| {});
    fx.still(1, 4);
    let exec = Arc::new(StubExecutor::failing(1));
    let m = materializer(Arc::clone(&exec));

    let task = m.plan(&EpisodeRecord::new("", "Aldhani", 1, 4), &show);
    let err = m.create(&task).unwrap_err();
    assert!(matches!(err, CardError::Render(_)));
    assert!(err.to_string().contains("stub stderr"));
    assert!(!task.output.exists());
    assert!(!scratch_path(&task.output).exists());
    assert_eq!(
        *exec.cleaned.lock().unwrap(),
        vec![scratch_path(&task.output)]
    );
}

#[test]
fn success_without_output_file_is_a_render_error() {
    let fx = Fixture::new("no_output");
    let show = fx.show(&[], |_| {});
    fx.still(1, 5);
    let exec = Arc::new(StubExecutor {
        skip_write: true,
        ..StubExecutor::default()
    });
    let m = materializer(Arc::clone(&exec));

    let task = m.plan(&EpisodeRecord::new("", "The Axe Forgets", 1, 5), &show);
    assert!(matches!(m.create(&task), Err(CardError::Render(_))));
    assert!(!task.output.exists());
}

#[test]
fn second_pass_renders_nothing() {
    let fx = Fixture::new("idempotent");
    let records: Vec<_> = (1..=4)
        .map(|e| EpisodeRecord::new("", format!("Episode {e}"), 1, e))
        .collect();
    let show = fx.show(&records, |_| {});
    for e in 1..=4 {
        fx.still(1, e);
    }
    let exec = Arc::new(StubExecutor::default());
    let m = materializer(Arc::clone(&exec));

    let first = m.create_missing(&show).unwrap();
    assert_eq!(first.created, 4);
    assert_eq!(exec.calls(), 4);

    let second = m.create_missing(&show).unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped_existing, 4);
    assert_eq!(exec.calls(), 4);
}

#[test]
fn pass_isolates_failures_and_tallies_outcomes() {
    let fx = Fixture::new("tally");
    let records = vec![
        EpisodeRecord::new("", "One", 1, 1),
        EpisodeRecord::new("", "Two", 1, 2),
        EpisodeRecord::new("", "One again", 1, 1),
    ];
    let show = fx.show(&records, |_| {});
    fx.still(1, 1);
    let exec = Arc::new(StubExecutor::failing(2));
    let m = materializer(Arc::clone(&exec));

    let stats = m.create_missing(&show).unwrap();
    assert_eq!(stats.skipped_missing_source, 1);
    assert_eq!(stats.failed(), 1);
    assert_eq!(stats.total(), 2);
    assert_eq!(exec.calls(), 1);
}

#[test]
fn unloaded_show_is_rejected() {
    let fx = Fixture::new("unloaded");
    let show = fx.show(&[], |_| {});
    let unloaded = Show::new(show.config().clone(), &Preferences::new(&fx.root)).unwrap();
    let m = materializer(Arc::new(StubExecutor::default()));
    assert!(m.create_missing(&unloaded).is_err());
}

#[test]
fn font_validation_withholds_unrenderable_cards() {
    let fx = Fixture::new("font_validation");
    let font = fx.root.join("Synthetic.ttf");
    synthetic_font::write_font(&font).unwrap();

    let show = fx.show(&[], |cfg| {
        cfg.hide_season_titles = true;
        cfg.font = Some(FontOverride {
            file: Some(font.clone()),
            ..FontOverride::default()
        });
    });
    fx.still(1, 1);
    fx.still(1, 2);
    let exec = Arc::new(StubExecutor::default());
    let m = materializer(Arc::clone(&exec));

    let blocked = m.plan(&EpisodeRecord::new("", "ab", 1, 1), &show);
    match m.create(&blocked) {
        Err(CardError::MissingGlyphs { missing, .. }) => {
            assert_eq!(missing, ['B'].into_iter().collect());
        }
        other => panic!("expected missing glyphs, got {other:?}"),
    }
    assert_eq!(exec.calls(), 0);

    let fine = m.plan(&EpisodeRecord::new("a", "c", 1, 2), &show);
    assert_eq!(m.create(&fine).unwrap(), CardOutcome::Created);
    assert_eq!(exec.calls(), 1);
}

#[test]
fn scratch_path_is_hidden_sibling_with_same_extension() {
    let p = scratch_path(Path::new("/tv/Season 1/Show - S01E01.jpg"));
    assert_eq!(p, PathBuf::from("/tv/Season 1/.Show - S01E01.partial.jpg"));
}

#[test]
fn stats_merge_adds_up() {
    let mut a = MaterializeStats {
        created: 1,
        skipped_existing: 2,
        ..MaterializeStats::default()
    };
    let b = MaterializeStats {
        created: 3,
        skipped_missing_source: 1,
        failures: vec![CardFailure {
            output: PathBuf::from("x"),
            error: "boom".into(),
        }],
        ..MaterializeStats::default()
    };
    a.merge(&b);
    assert_eq!(a.created, 4);
    assert_eq!(a.total(), 8);
}

#[test]
fn zero_threads_is_rejected() {
    let err = CardMaterializer::new(
        Arc::new(StandardStyle::default()),
        Arc::new(StubExecutor::default()),
        Arc::new(FontCache::new()),
        MaterializerOpts {
            threads: Some(0),
            ..MaterializerOpts::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, CardError::Config(_)));
}
