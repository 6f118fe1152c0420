//! Integration tests for the sync, scan and rename pipeline
//!
//! These tests drive the engine through in-memory stores and a static
//! catalog over real temporary directories:
//! - Unmapped folder discovery and matching
//! - Single-flight sync/import jobs
//! - Scan + clean-up idempotence
//! - Rename behavior and association preservation

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use curator::config::Config;
use curator::engine::Engine;
use curator::model::EpisodeFileRecord;
use curator::services::catalog::{CatalogEpisode, CatalogSeriesDetail, StaticCatalog};
use curator::services::sync::SeriesMapping;
use curator::store::{
    MemoryEpisodeFileStore, MemoryEpisodeStore, MemoryProfileStore, MemoryRootDirStore,
    MemorySeriesStore,
};

const OFFICE_ID: i32 = 65432;
const ROCK_ID: i32 = 12345;

fn office_detail() -> CatalogSeriesDetail {
    let episode = |season, number, title: &str| CatalogEpisode {
        season_number: season,
        episode_number: number,
        title: Some(title.to_string()),
        overview: None,
        air_date: NaiveDate::from_ymd_opt(2005, 3, 24),
    };

    CatalogSeriesDetail {
        external_id: OFFICE_ID,
        name: "The Office (US)".to_string(),
        overview: Some("Mockumentary about office life.".to_string()),
        status: Some("Ended".to_string()),
        first_aired: NaiveDate::from_ymd_opt(2005, 3, 24),
        episodes: vec![
            episode(1, 1, "Pilot"),
            episode(1, 2, "Diversity Day"),
            episode(1, 3, "Health Care"),
            episode(2, 1, "The Dundies"),
        ],
    }
}

fn rock_detail() -> CatalogSeriesDetail {
    CatalogSeriesDetail {
        external_id: ROCK_ID,
        name: "30 Rock".to_string(),
        overview: None,
        status: Some("Ended".to_string()),
        first_aired: NaiveDate::from_ymd_opt(2006, 10, 11),
        episodes: vec![CatalogEpisode {
            season_number: 1,
            episode_number: 1,
            title: Some("Pilot".to_string()),
            overview: None,
            air_date: None,
        }],
    }
}

fn seeded_catalog() -> Arc<StaticCatalog> {
    let catalog = Arc::new(StaticCatalog::new());
    catalog.insert(office_detail());
    catalog.insert(rock_detail());
    catalog
}

fn build_engine(catalog: Arc<StaticCatalog>) -> Engine {
    Engine::with_components(
        Arc::new(MemoryRootDirStore::new()),
        Arc::new(MemorySeriesStore::new()),
        Arc::new(MemoryEpisodeStore::new()),
        Arc::new(MemoryEpisodeFileStore::new()),
        Arc::new(MemoryProfileStore::with_defaults()),
        catalog,
        &Config::default(),
    )
}

async fn wait_for_sync(engine: &Engine) {
    for _ in 0..500 {
        if !engine.is_sync_running() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("sync job did not finish in time");
}

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"media").unwrap();
}

// ============================================================================
// Unmapped folder discovery
// ============================================================================

#[tokio::test]
async fn test_list_unmapped_folders_resolves_known_and_surfaces_unknown() {
    let engine = build_engine(seeded_catalog());
    let root = TempDir::new().unwrap();

    fs::create_dir(root.path().join("The Office (US)")).unwrap();
    fs::create_dir(root.path().join("Totally Unknown Show")).unwrap();
    touch(&root.path().join("stray-file.mkv"));

    let unmapped = engine
        .list_unmapped_folders(&root.path().to_string_lossy())
        .await
        .unwrap();

    // Plain files are not folders; both directories are surfaced
    assert_eq!(unmapped.len(), 2);

    let office = unmapped
        .iter()
        .find(|f| f.path.ends_with("The Office (US)"))
        .unwrap();
    let candidate = office.candidate.as_ref().expect("office should resolve");
    assert_eq!(candidate.external_id, OFFICE_ID);
    assert_eq!(candidate.name, "The Office (US)");

    let unknown = unmapped
        .iter()
        .find(|f| f.path.ends_with("Totally Unknown Show"))
        .unwrap();
    assert!(unknown.candidate.is_none(), "unknown folder must still be listed");
}

#[tokio::test]
async fn test_list_unmapped_folders_excludes_tracked_series() {
    let engine = build_engine(seeded_catalog());
    let root = TempDir::new().unwrap();

    let office_path = root.path().join("The Office (US)");
    fs::create_dir(&office_path).unwrap();

    assert!(engine.begin_sync_mapped(vec![SeriesMapping {
        path: office_path.to_string_lossy().to_string(),
        external_id: OFFICE_ID,
    }]));
    wait_for_sync(&engine).await;

    let unmapped = engine
        .list_unmapped_folders(&root.path().to_string_lossy())
        .await
        .unwrap();
    assert!(unmapped.is_empty(), "mapped folder must not be listed again");
}

#[tokio::test]
async fn test_list_unmapped_folders_missing_root_is_hard_error() {
    let engine = build_engine(seeded_catalog());
    let result = engine.list_unmapped_folders("/nonexistent/tv-root").await;
    assert!(result.is_err());
}

// ============================================================================
// Sync and import jobs
// ============================================================================

#[tokio::test]
async fn test_sync_mapped_creates_series_and_scans() {
    let engine = build_engine(seeded_catalog());
    let root = TempDir::new().unwrap();
    let office_path = root.path().join("The Office (US)");

    touch(&office_path.join("The Office (US) - S01E01 - Pilot.mkv"));
    touch(&office_path.join("The.Office.US.S01E02.720p.HDTV.mkv"));
    touch(&office_path.join("extras.mkv"));
    touch(&office_path.join("notes.txt"));

    let accepted = engine.begin_sync_mapped(vec![SeriesMapping {
        path: office_path.to_string_lossy().to_string(),
        external_id: OFFICE_ID,
    }]);
    assert!(accepted);
    wait_for_sync(&engine).await;

    let series = engine.list_all_series().await.unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].external_id, OFFICE_ID);
    assert_eq!(series[0].name, "The Office (US)");
    assert_eq!(series[0].path, office_path.to_string_lossy());
    assert!(series[0].quality_profile_id.is_some());

    // Two parseable files tracked; "extras.mkv" and "notes.txt" are not
    let files = engine.list_episode_files().await.unwrap();
    assert_eq!(files.len(), 2);
    for file in &files {
        assert!(file.path.starts_with(&series[0].path));
    }

    let episodes = engine.list_episodes(series[0].id).await.unwrap();
    assert_eq!(episodes.len(), 4);
    let pilot = episodes
        .iter()
        .find(|e| e.season_number == 1 && e.episode_number == 1)
        .unwrap();
    assert!(pilot.episode_file_id.is_some(), "pilot must link to its file");
    let health_care = episodes
        .iter()
        .find(|e| e.season_number == 1 && e.episode_number == 3)
        .unwrap();
    assert!(health_care.episode_file_id.is_none());
}

#[tokio::test]
async fn test_second_job_rejected_while_first_runs() {
    let catalog = Arc::new(StaticCatalog::with_delay(Duration::from_millis(200)));
    catalog.insert(office_detail());
    catalog.insert(rock_detail());
    let engine = build_engine(catalog);

    let root = TempDir::new().unwrap();
    let office_path = root.path().join("The Office (US)");
    fs::create_dir(&office_path).unwrap();

    assert!(engine.begin_sync_mapped(vec![SeriesMapping {
        path: office_path.to_string_lossy().to_string(),
        external_id: OFFICE_ID,
    }]));

    // Both entry points refuse while the first job is in flight
    let other = root.path().join("30 Rock");
    assert!(!engine.begin_sync_mapped(vec![SeriesMapping {
        path: other.to_string_lossy().to_string(),
        external_id: ROCK_ID,
    }]));
    assert!(!engine.begin_import_new(&root.path().to_string_lossy(), ROCK_ID, "30 Rock"));

    wait_for_sync(&engine).await;

    // The rejected jobs mutated nothing
    let series = engine.list_all_series().await.unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].external_id, OFFICE_ID);
    assert!(!other.exists());

    // Once the flag clears, new jobs are accepted again
    assert!(engine.begin_import_new(&root.path().to_string_lossy(), ROCK_ID, "30 Rock"));
    wait_for_sync(&engine).await;
    assert_eq!(engine.list_all_series().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unresolved_mappings_are_skipped_without_affecting_siblings() {
    let engine = build_engine(seeded_catalog());
    let root = TempDir::new().unwrap();
    let unresolved = root.path().join("Mystery Show");
    let office_path = root.path().join("The Office (US)");
    fs::create_dir(&unresolved).unwrap();
    fs::create_dir(&office_path).unwrap();

    assert!(engine.begin_sync_mapped(vec![
        SeriesMapping {
            path: unresolved.to_string_lossy().to_string(),
            external_id: 0,
        },
        SeriesMapping {
            path: office_path.to_string_lossy().to_string(),
            external_id: OFFICE_ID,
        },
    ]));
    wait_for_sync(&engine).await;

    let series = engine.list_all_series().await.unwrap();
    assert_eq!(series.len(), 1, "sentinel mapping skipped, sibling imported");
    assert_eq!(series[0].external_id, OFFICE_ID);
}

#[tokio::test]
async fn test_catalog_failure_for_one_mapping_does_not_abort_batch() {
    let engine = build_engine(seeded_catalog());
    let root = TempDir::new().unwrap();
    let bogus = root.path().join("Bogus");
    let office_path = root.path().join("The Office (US)");
    fs::create_dir(&bogus).unwrap();
    fs::create_dir(&office_path).unwrap();

    assert!(engine.begin_sync_mapped(vec![
        SeriesMapping {
            path: bogus.to_string_lossy().to_string(),
            external_id: 99999, // not in the catalog
        },
        SeriesMapping {
            path: office_path.to_string_lossy().to_string(),
            external_id: OFFICE_ID,
        },
    ]));
    wait_for_sync(&engine).await;

    let series = engine.list_all_series().await.unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].external_id, OFFICE_ID);
}

#[tokio::test]
async fn test_import_new_creates_folder_and_series() {
    let engine = build_engine(seeded_catalog());
    let root = TempDir::new().unwrap();

    assert!(engine.begin_import_new(&root.path().to_string_lossy(), ROCK_ID, "30 Rock"));
    wait_for_sync(&engine).await;

    let expected = root.path().join("30 Rock");
    assert!(expected.is_dir(), "import must create the series folder");

    let series = engine.list_all_series().await.unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].name, "30 Rock");
    assert_eq!(series[0].path, expected.to_string_lossy());
}

#[tokio::test]
async fn test_refresh_episode_info_preserves_file_links() {
    let catalog = seeded_catalog();
    let engine = build_engine(catalog.clone());
    let root = TempDir::new().unwrap();
    let office_path = root.path().join("The Office (US)");
    touch(&office_path.join("office.s01e01.mkv"));

    assert!(engine.begin_sync_mapped(vec![SeriesMapping {
        path: office_path.to_string_lossy().to_string(),
        external_id: OFFICE_ID,
    }]));
    wait_for_sync(&engine).await;

    let series = engine.list_all_series().await.unwrap().remove(0);
    let before = engine.list_episodes(series.id).await.unwrap();
    let linked_before = before
        .iter()
        .find(|e| e.season_number == 1 && e.episode_number == 1)
        .unwrap()
        .episode_file_id;
    assert!(linked_before.is_some());

    // Catalog learns a better title; refresh must keep the link
    let mut detail = office_detail();
    detail.episodes[0].title = Some("Pilot (Extended)".to_string());
    catalog.insert(detail);

    engine.refresh_episode_info(series.id).await.unwrap();

    let after = engine.list_episodes(series.id).await.unwrap();
    let pilot = after
        .iter()
        .find(|e| e.season_number == 1 && e.episode_number == 1)
        .unwrap();
    assert_eq!(pilot.title.as_deref(), Some("Pilot (Extended)"));
    assert_eq!(pilot.episode_file_id, linked_before);
}

// ============================================================================
// Scan and clean-up
// ============================================================================

#[tokio::test]
async fn test_cleanup_then_scan_is_idempotent_on_unchanged_folder() {
    let engine = build_engine(seeded_catalog());
    let root = TempDir::new().unwrap();
    let office_path = root.path().join("The Office (US)");
    touch(&office_path.join("office.s01e01.mkv"));
    touch(&office_path.join("Season 01/office.s01e02.720p.mkv"));

    assert!(engine.begin_sync_mapped(vec![SeriesMapping {
        path: office_path.to_string_lossy().to_string(),
        external_id: OFFICE_ID,
    }]));
    wait_for_sync(&engine).await;

    let series = engine.list_all_series().await.unwrap().remove(0);

    let snapshot = |files: Vec<EpisodeFileRecord>| {
        let mut paths: Vec<String> = files.into_iter().map(|f| f.path).collect();
        paths.sort();
        paths
    };

    let first_pass = snapshot(engine.list_episode_files().await.unwrap());
    assert_eq!(first_pass.len(), 2);

    let summary = engine.rescan_series(series.id).await.unwrap();
    assert_eq!(summary.new_files, 0);
    assert_eq!(summary.already_tracked, 2);
    let second_pass = snapshot(engine.list_episode_files().await.unwrap());
    assert_eq!(first_pass, second_pass);

    let summary = engine.rescan_series(series.id).await.unwrap();
    assert_eq!(summary.new_files, 0);
    let third_pass = snapshot(engine.list_episode_files().await.unwrap());
    assert_eq!(first_pass, third_pass);
}

#[tokio::test]
async fn test_cleanup_removes_records_for_deleted_files() {
    let engine = build_engine(seeded_catalog());
    let root = TempDir::new().unwrap();
    let office_path = root.path().join("The Office (US)");
    let doomed = office_path.join("office.s01e01.mkv");
    touch(&doomed);
    touch(&office_path.join("office.s01e02.mkv"));

    assert!(engine.begin_sync_mapped(vec![SeriesMapping {
        path: office_path.to_string_lossy().to_string(),
        external_id: OFFICE_ID,
    }]));
    wait_for_sync(&engine).await;

    let series = engine.list_all_series().await.unwrap().remove(0);
    assert_eq!(engine.list_episode_files().await.unwrap().len(), 2);

    fs::remove_file(&doomed).unwrap();
    engine.rescan_series(series.id).await.unwrap();

    let files = engine.list_episode_files().await.unwrap();
    assert_eq!(files.len(), 1);
    assert!(!files[0].path.ends_with("office.s01e01.mkv"));

    // The deleted file's episode is detached again
    let episodes = engine.list_episodes(series.id).await.unwrap();
    let pilot = episodes
        .iter()
        .find(|e| e.season_number == 1 && e.episode_number == 1)
        .unwrap();
    assert!(pilot.episode_file_id.is_none());
}

// ============================================================================
// Renaming
// ============================================================================

#[tokio::test]
async fn test_rename_series_moves_files_and_preserves_associations() {
    let engine = build_engine(seeded_catalog());
    let root = TempDir::new().unwrap();
    let office_path = root.path().join("The Office (US)");
    touch(&office_path.join("office.s01e01.1080p.WEB-DL.mkv"));
    touch(&office_path.join("The Office US S02E01 HDTV.mkv"));

    assert!(engine.begin_sync_mapped(vec![SeriesMapping {
        path: office_path.to_string_lossy().to_string(),
        external_id: OFFICE_ID,
    }]));
    wait_for_sync(&engine).await;

    let series = engine.list_all_series().await.unwrap().remove(0);

    // Remember which episodes each file is associated with
    let episodes_before = engine.list_episodes(series.id).await.unwrap();
    let linked_before: Vec<_> = episodes_before
        .iter()
        .filter(|e| e.episode_file_id.is_some())
        .map(|e| (e.id, e.episode_file_id))
        .collect();
    assert_eq!(linked_before.len(), 2);

    let outcomes = engine.rename_series(series.id).await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.error.is_none()));
    assert!(outcomes.iter().all(|o| o.renamed));

    let expected_pilot = office_path
        .join("Season 01")
        .join("The Office (US) - S01E01 - Pilot.mkv");
    let expected_dundies = office_path
        .join("Season 02")
        .join("The Office (US) - S02E01 - The Dundies.mkv");
    assert!(expected_pilot.is_file());
    assert!(expected_dundies.is_file());
    assert!(!office_path.join("office.s01e01.1080p.WEB-DL.mkv").exists());

    // Index follows the filesystem
    let files = engine.list_episode_files().await.unwrap();
    for file in &files {
        assert!(Path::new(&file.path).is_file(), "index points at {}", file.path);
        assert!(file.path.starts_with(&series.path));
    }

    // Associations are keyed by file id and survive the rename
    let episodes_after = engine.list_episodes(series.id).await.unwrap();
    let linked_after: Vec<_> = episodes_after
        .iter()
        .filter(|e| e.episode_file_id.is_some())
        .map(|e| (e.id, e.episode_file_id))
        .collect();
    assert_eq!(linked_before, linked_after);
}

#[tokio::test]
async fn test_rename_is_idempotent_once_canonical() {
    let engine = build_engine(seeded_catalog());
    let root = TempDir::new().unwrap();
    let office_path = root.path().join("The Office (US)");
    touch(&office_path.join("office.s01e01.mkv"));

    assert!(engine.begin_sync_mapped(vec![SeriesMapping {
        path: office_path.to_string_lossy().to_string(),
        external_id: OFFICE_ID,
    }]));
    wait_for_sync(&engine).await;

    let series = engine.list_all_series().await.unwrap().remove(0);

    let first = engine.rename_series(series.id).await.unwrap();
    assert!(first[0].renamed);

    let second = engine.rename_series(series.id).await.unwrap();
    assert_eq!(second.len(), 1);
    assert!(!second[0].renamed, "canonical file must not be touched again");
    assert!(second[0].error.is_none());
}

#[tokio::test]
async fn test_rename_multi_episode_file_keeps_both_links() {
    let engine = build_engine(seeded_catalog());
    let root = TempDir::new().unwrap();
    let office_path = root.path().join("The Office (US)");
    touch(&office_path.join("The Office (US) - S01E01-E02 - double.mkv"));

    assert!(engine.begin_sync_mapped(vec![SeriesMapping {
        path: office_path.to_string_lossy().to_string(),
        external_id: OFFICE_ID,
    }]));
    wait_for_sync(&engine).await;

    let series = engine.list_all_series().await.unwrap().remove(0);
    let outcomes = engine.rename_series(series.id).await.unwrap();
    assert_eq!(outcomes.len(), 1);

    let new_path = outcomes[0].new_path.as_ref().unwrap();
    assert!(new_path.contains("S01E01-E02"));
    assert!(new_path.contains("Pilot + Diversity Day"));

    let episodes = engine.list_episodes(series.id).await.unwrap();
    let linked: Vec<_> = episodes
        .iter()
        .filter(|e| e.episode_file_id.is_some())
        .collect();
    assert_eq!(linked.len(), 2, "both episodes keep their association");
}

#[tokio::test]
async fn test_rename_collision_fails_that_file_only() {
    let engine = build_engine(seeded_catalog());
    let root = TempDir::new().unwrap();
    let office_path = root.path().join("The Office (US)");
    touch(&office_path.join("office.s01e01.mkv"));
    touch(&office_path.join("office.s01e02.mkv"));

    assert!(engine.begin_sync_mapped(vec![SeriesMapping {
        path: office_path.to_string_lossy().to_string(),
        external_id: OFFICE_ID,
    }]));
    wait_for_sync(&engine).await;

    // An untracked file already occupies the pilot's canonical target
    touch(
        &office_path
            .join("Season 01")
            .join("The Office (US) - S01E01 - Pilot.mkv"),
    );

    let series = engine.list_all_series().await.unwrap().remove(0);
    let outcomes = engine.rename_series(series.id).await.unwrap();
    assert_eq!(outcomes.len(), 2);

    let collided = outcomes
        .iter()
        .find(|o| o.original_path.ends_with("office.s01e01.mkv"))
        .unwrap();
    assert!(collided.error.is_some());
    assert!(!collided.renamed);
    // The collided file stays where it was, and the index still points at it
    assert!(office_path.join("office.s01e01.mkv").is_file());

    let other = outcomes
        .iter()
        .find(|o| o.original_path.ends_with("office.s01e02.mkv"))
        .unwrap();
    assert!(other.error.is_none(), "sibling files proceed past a collision");
    assert!(other.renamed);
}

#[tokio::test]
async fn test_rename_episode_granularity() {
    let engine = build_engine(seeded_catalog());
    let root = TempDir::new().unwrap();
    let office_path = root.path().join("The Office (US)");
    touch(&office_path.join("office.s01e01.mkv"));
    touch(&office_path.join("office.s01e02.mkv"));

    assert!(engine.begin_sync_mapped(vec![SeriesMapping {
        path: office_path.to_string_lossy().to_string(),
        external_id: OFFICE_ID,
    }]));
    wait_for_sync(&engine).await;

    let series = engine.list_all_series().await.unwrap().remove(0);
    let episodes = engine.list_episodes(series.id).await.unwrap();
    let pilot = episodes
        .iter()
        .find(|e| e.season_number == 1 && e.episode_number == 1)
        .unwrap();

    let outcomes = engine.rename_episode(pilot.id).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].renamed);

    // Only the pilot's file moved
    assert!(!office_path.join("office.s01e01.mkv").exists());
    assert!(office_path.join("office.s01e02.mkv").is_file());
}

// ============================================================================
// Series management and path law
// ============================================================================

#[tokio::test]
async fn test_delete_series_removes_records_but_not_files() {
    let engine = build_engine(seeded_catalog());
    let root = TempDir::new().unwrap();
    let office_path = root.path().join("The Office (US)");
    let media = office_path.join("office.s01e01.mkv");
    touch(&media);

    assert!(engine.begin_sync_mapped(vec![SeriesMapping {
        path: office_path.to_string_lossy().to_string(),
        external_id: OFFICE_ID,
    }]));
    wait_for_sync(&engine).await;

    let series_id = engine.list_all_series().await.unwrap()[0].id;
    assert!(engine.delete_series(series_id).await.unwrap());

    assert!(engine.list_all_series().await.unwrap().is_empty());
    assert!(engine.list_episode_files().await.unwrap().is_empty());
    assert!(engine.list_episodes(series_id).await.unwrap().is_empty());
    assert!(media.is_file(), "deleting the record leaves disk alone");
}

#[tokio::test]
async fn test_relative_episode_path_law() {
    let engine = build_engine(seeded_catalog());
    let root = TempDir::new().unwrap();
    let office_path = root.path().join("The Office (US)");
    touch(&office_path.join("Season 01/office.s01e01.mkv"));

    assert!(engine.begin_sync_mapped(vec![SeriesMapping {
        path: office_path.to_string_lossy().to_string(),
        external_id: OFFICE_ID,
    }]));
    wait_for_sync(&engine).await;

    let series = engine.list_all_series().await.unwrap().remove(0);
    let files = engine.list_episode_files().await.unwrap();

    let relative = engine.relative_episode_path(Some(&files[0]), &series);
    assert_eq!(relative, "Season 01/office.s01e01.mkv");
    assert!(!relative.starts_with('/'));
    assert!(!relative.contains(&series.path));

    assert_eq!(engine.relative_episode_path(None, &series), "");
}
