use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::*;
use crate::card::materialize::MaterializerOpts;
use crate::card::style::StandardStyle;
use crate::config::font::FontOverride;
use crate::config::settings::{Preferences, ShowConfig};
use crate::data::store::{EpisodeDataStore, EpisodeRecord};
use crate::font::coverage::FontCache;
use crate::foundation::error::CardError;
use crate::profile::variant::{FontMode, ProfileVariant, SeasonTitleMode};
use crate::stub_executor::StubExecutor;

fn root(name: &str) -> PathBuf {
    let root = PathBuf::from("target").join("unit_archive").join(name);
    let _ = std::fs::remove_dir_all(&root);
    std::fs::create_dir_all(root.join("source")).unwrap();
    root
}

fn full_show(root: &Path, with_data: bool) -> Show {
    let data = root.join("data.tsv");
    if with_data {
        let store = EpisodeDataStore::new(&data);
        store.create().unwrap();
        store.append(&EpisodeRecord::new("", "Rose", 1, 1)).unwrap();
        store.append(&EpisodeRecord::new("", "Christmas", 0, 1)).unwrap();
        std::fs::write(root.join("source").join("s1e1.jpg"), b"jpg").unwrap();
        std::fs::write(root.join("source").join("s0e1.jpg"), b"jpg").unwrap();
    }

    let mut cfg = ShowConfig::new("Doctor Who", 2005, root.join("media"));
    cfg.source_dir = Some(root.join("source"));
    cfg.data_file = Some(data);
    cfg.season_titles = BTreeMap::from([(1, "Series One".to_string())]);
    cfg.hide_season_titles = true;
    cfg.font = Some(FontOverride {
        color: Some("#3F5FA8".into()),
        ..FontOverride::default()
    });
    Show::new(cfg, &Preferences::new(root)).unwrap()
}

fn materializer(exec: Arc<StubExecutor>) -> CardMaterializer {
    CardMaterializer::new(
        Arc::new(StandardStyle::default()),
        exec,
        Arc::new(FontCache::new()),
        MaterializerOpts::default(),
    )
    .unwrap()
}

#[test]
fn expand_yields_one_loaded_show_per_variant() {
    let root = root("expand");
    let base = full_show(&root, true);
    let archiver = ShowArchiver::new(root.join("archive"));

    let shows = archiver.expand(&base).unwrap();
    assert_eq!(shows.len(), 6);
    assert!(shows.iter().all(|s| s.is_loaded() && s.episodes().len() == 2));

    let roots: BTreeSet<PathBuf> = shows.iter().map(|s| s.media_root().to_path_buf()).collect();
    assert_eq!(roots.len(), 6);
    assert!(roots.contains(
        &root
            .join("archive")
            .join("Doctor Who (2005)")
            .join("No Season Titles, Custom Font")
    ));
    assert!(!base.is_loaded());
}

#[test]
fn expand_fails_when_data_is_missing() {
    let root = root("expand_missing");
    let base = full_show(&root, false);
    let err = ShowArchiver::new(root.join("archive")).expand(&base).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn variants_never_share_output_paths() {
    let root = root("disjoint");
    let base = full_show(&root, true);
    let archiver = ShowArchiver::new(root.join("archive"));
    let exec = Arc::new(StubExecutor::default());
    let m = materializer(Arc::clone(&exec));

    let mut outputs = BTreeSet::new();
    for show in archiver.expand(&base).unwrap() {
        for record in show.episodes() {
            let output = m.plan(record, &show).output;
            assert!(output.starts_with(archiver.archive_root()));
            assert!(outputs.insert(output));
        }
    }
    assert_eq!(outputs.len(), 12);
}

#[test]
fn archive_all_isolates_failing_variants() {
    let root = root("isolation");
    let base = full_show(&root, true);
    let archiver = ShowArchiver::new(root.join("archive"));
    let exec = Arc::new(StubExecutor::failing_when("Custom Font"));
    let m = materializer(Arc::clone(&exec));

    let reports = archiver.archive_all(std::slice::from_ref(&base), &m);
    assert_eq!(reports.len(), 6);
    for r in &reports {
        let stats = r.stats().unwrap();
        if r.profile.font == FontMode::Custom {
            assert_eq!(stats.failed(), 2, "{}", r.profile);
            assert_eq!(stats.created, 0);
        } else {
            assert_eq!(stats.created, 2, "{}", r.profile);
        }
    }
    assert_eq!(exec.calls(), 12);

    let hidden_generic = root
        .join("archive")
        .join("Doctor Who (2005)")
        .join("No Season Titles, Generic Font")
        .join("Specials")
        .join("Doctor Who (2005) - S00E01.jpg");
    assert!(hidden_generic.is_file());
}

#[test]
fn archive_all_continues_past_broken_shows() {
    let good_root = root("continue_good");
    let bad_root = root("continue_bad");
    let good = full_show(&good_root, true);
    let bad = full_show(&bad_root, false);
    let archiver = ShowArchiver::new(good_root.join("archive"));
    let m = materializer(Arc::new(StubExecutor::default()));

    let reports = archiver.archive_all(&[bad, good], &m);
    assert_eq!(reports.len(), 7);
    assert!(matches!(reports[0].result, Err(CardError::NotFound(_))));
    assert!(reports[1..].iter().all(|r| r.stats().is_some_and(|s| s.created == 2)));
    assert_eq!(
        reports[1].profile,
        ProfileVariant::new(SeasonTitleMode::Custom, FontMode::Custom)
    );
}
