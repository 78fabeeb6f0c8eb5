use std::collections::BTreeMap;

use super::*;
use crate::config::font::{FontOverride, TextCase};

fn prefs() -> Preferences {
    let mut p = Preferences::new("/src");
    p.default_font = FontOverride {
        file: Some(PathBuf::from("/fonts/Generic.ttf")),
        ..FontOverride::default()
    };
    p
}

fn config() -> ShowConfig {
    ShowConfig::new("Severance", 2022, "/tv/Severance (2022)")
}

#[test]
fn defaults_derive_from_preferences() {
    let show = Show::new(config(), &prefs()).unwrap();
    assert_eq!(show.full_name(), "Severance (2022)");
    assert_eq!(show.source_dir(), Path::new("/src/Severance (2022)"));
    assert_eq!(
        show.store().path(),
        Path::new("/src/Severance (2022)/data.tsv")
    );
    assert_eq!(show.flags(), ProfileFlags::default());
    assert_eq!(
        show.variant(),
        ProfileVariant::new(SeasonTitleMode::Generic, FontMode::Generic)
    );
    assert!(!show.is_loaded());
    assert!(show.episodes().is_empty());
}

#[test]
fn flags_follow_configuration() {
    let mut cfg = config();
    cfg.season_titles = BTreeMap::from([(1, "Part One".to_string())]);
    cfg.font = Some(FontOverride {
        color: Some("gold".into()),
        ..FontOverride::default()
    });
    cfg.hide_season_titles = true;

    let show = Show::new(cfg, &prefs()).unwrap();
    assert_eq!(
        show.flags(),
        ProfileFlags {
            has_custom_season_titles: true,
            has_custom_font: true,
            hides_season_titles: true,
        }
    );
    assert_eq!(show.variant().season, SeasonTitleMode::Hidden);
    assert_eq!(show.variant().font, FontMode::Custom);
}

#[test]
fn override_identical_to_generic_is_not_custom() {
    let mut cfg = config();
    cfg.font = Some(FontOverride {
        file: Some(PathBuf::from("/fonts/Generic.ttf")),
        ..FontOverride::default()
    });
    let show = Show::new(cfg, &prefs()).unwrap();
    assert!(!show.flags().has_custom_font);
}

#[test]
fn invalid_font_override_is_a_config_error() {
    let mut cfg = config();
    cfg.font = Some(FontOverride {
        size: Some(-2.0),
        ..FontOverride::default()
    });
    assert!(matches!(
        Show::new(cfg, &prefs()).unwrap_err(),
        CardError::Config(_)
    ));
}

#[test]
fn season_labels_per_mode() {
    let mut cfg = config();
    cfg.season_titles = BTreeMap::from([(1, "Part One".to_string())]);
    let show = Show::new(cfg, &prefs()).unwrap();

    let custom = show.with_variant(
        ProfileVariant::new(SeasonTitleMode::Custom, FontMode::Generic),
        "/a",
    );
    assert_eq!(custom.season_label(1).as_deref(), Some("Part One"));
    assert_eq!(custom.season_label(2).as_deref(), Some("Season 2"));

    let generic = show.with_variant(
        ProfileVariant::new(SeasonTitleMode::Generic, FontMode::Generic),
        "/b",
    );
    assert_eq!(generic.season_label(1).as_deref(), Some("Season 1"));
    assert_eq!(generic.season_label(0).as_deref(), Some("Specials"));

    let hidden = show.with_variant(
        ProfileVariant::new(SeasonTitleMode::Hidden, FontMode::Generic),
        "/c",
    );
    assert_eq!(hidden.season_label(1), None);
    assert_eq!(hidden.media_root(), Path::new("/c"));
}

#[test]
fn card_text_applies_font_formatting() {
    let mut cfg = config();
    cfg.font = Some(FontOverride {
        case: Some(TextCase::Source),
        replacements: [("&".to_string(), "and".to_string())].into_iter().collect(),
        ..FontOverride::default()
    });
    let show = Show::new(cfg, &prefs()).unwrap();
    let text = show.card_text(&EpisodeRecord::new("", "Good News & Bad", 1, 1));
    assert_eq!(text.lines, vec!["Good News and Bad".to_string()]);
    assert_eq!(text.season_label.as_deref(), Some("Season 1"));

    let generic = show.with_variant(
        ProfileVariant::new(SeasonTitleMode::Generic, FontMode::Generic),
        "/g",
    );
    let text = generic.card_text(&EpisodeRecord::new("", "Good News & Bad", 1, 1));
    assert_eq!(text.lines, vec!["GOOD NEWS & BAD".to_string()]);
    assert_eq!(text.season_label.as_deref(), Some("SEASON 1"));
}

#[test]
fn card_file_names_are_padded_and_sanitized() {
    let show = Show::new(
        ShowConfig::new("Who: Are/You?", 1999, "/tv/who"),
        &prefs(),
    )
    .unwrap();
    let name = show.card_file_name(&EpisodeRecord::new("", "x", 0, 3), "jpg");
    assert_eq!(name, "Who AreYou (1999) - S00E03.jpg");
}

#[test]
fn load_reports_missing_data_as_not_found() {
    let mut cfg = config();
    cfg.data_file = Some(PathBuf::from("target/unit_show/absent.tsv"));
    let mut show = Show::new(cfg, &prefs()).unwrap();
    assert!(show.load().unwrap_err().is_not_found());
    assert!(!show.is_loaded());
}

#[test]
fn load_reads_episode_rows() {
    let path = PathBuf::from("target").join("unit_show").join("loaded.tsv");
    let _ = std::fs::remove_file(&path);
    let store = EpisodeDataStore::new(&path);
    store.create().unwrap();
    store.append(&EpisodeRecord::new("", "Good News", 1, 1)).unwrap();
    store.append(&EpisodeRecord::new("Half", "Loop", 1, 2)).unwrap();

    let mut cfg = config();
    cfg.data_file = Some(path);
    let mut show = Show::new(cfg, &prefs()).unwrap();
    assert_eq!(show.load().unwrap(), 2);
    assert!(show.is_loaded());
    assert_eq!(show.episodes()[1].title_top, "Half");

    let clone = show.with_variant(show.variant(), "/elsewhere");
    assert_eq!(clone.episodes().len(), 2);
}
