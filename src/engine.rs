//! Engine facade
//!
//! Bundles the engine's services behind one handle for the (out-of-tree)
//! HTTP layer. Production wiring uses the SQLite repositories and the
//! TVMaze catalog client; tests inject in-memory stores and a static
//! catalog through [`Engine::with_components`].

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use uuid::Uuid;

use crate::config::Config;
use crate::model::{
    EpisodeFileRecord, EpisodeRecord, QualityProfileRecord, RootDirRecord, SeriesRecord,
    UpdateSeries,
};
use crate::services::catalog::{CatalogCandidate, CatalogClient};
use crate::services::file_utils::relative_episode_path;
use crate::services::locks::SeriesLockMap;
use crate::services::matcher::{FolderScanner, SeriesMatcher, UnmappedFolder};
use crate::services::renamer::{RenameEngine, RenameOutcome};
use crate::services::scanner::{EpisodeFileScanner, ScanSummary};
use crate::services::sync::{SeriesMapping, SyncCoordinator};
use crate::store::{EpisodeFileStore, EpisodeStore, ProfileStore, RootDirStore, SeriesStore};

/// The assembled engine
pub struct Engine {
    root_dirs: Arc<dyn RootDirStore>,
    series: Arc<dyn SeriesStore>,
    episodes: Arc<dyn EpisodeStore>,
    files: Arc<dyn EpisodeFileStore>,
    profiles: Arc<dyn ProfileStore>,
    scanner: Arc<EpisodeFileScanner>,
    renamer: Arc<RenameEngine>,
    folder_scanner: Arc<FolderScanner>,
    sync: Arc<SyncCoordinator>,
    locks: Arc<SeriesLockMap>,
}

impl Engine {
    /// Assemble an engine from explicit components
    #[allow(clippy::too_many_arguments)]
    pub fn with_components(
        root_dirs: Arc<dyn RootDirStore>,
        series: Arc<dyn SeriesStore>,
        episodes: Arc<dyn EpisodeStore>,
        files: Arc<dyn EpisodeFileStore>,
        profiles: Arc<dyn ProfileStore>,
        catalog: Arc<dyn CatalogClient>,
        config: &Config,
    ) -> Self {
        let locks = Arc::new(SeriesLockMap::new());
        let scanner = Arc::new(EpisodeFileScanner::new(episodes.clone(), files.clone()));
        let renamer = Arc::new(RenameEngine::new(
            series.clone(),
            episodes.clone(),
            files.clone(),
            locks.clone(),
            config.naming_template.clone(),
        ));
        let matcher = Arc::new(SeriesMatcher::new(catalog.clone(), config.match_threshold));
        let folder_scanner = Arc::new(FolderScanner::new(series.clone(), matcher));
        let sync = Arc::new(SyncCoordinator::new(
            series.clone(),
            episodes.clone(),
            profiles.clone(),
            catalog,
            scanner.clone(),
            locks.clone(),
        ));

        Self {
            root_dirs,
            series,
            episodes,
            files,
            profiles,
            scanner,
            renamer,
            folder_scanner,
            sync,
            locks,
        }
    }

    /// Production wiring: SQLite stores plus the TVMaze catalog client
    #[cfg(feature = "sqlite")]
    pub async fn connect(config: &Config) -> Result<Self> {
        use crate::services::catalog::TvMazeClient;

        let db = crate::db::Database::connect(&config.database_path).await?;
        let catalog: Arc<dyn CatalogClient> = match &config.catalog_base_url {
            Some(base_url) => Arc::new(TvMazeClient::with_base_url(base_url)),
            None => Arc::new(TvMazeClient::new()),
        };

        tracing::info!(database = %config.database_path, "Engine connected");

        Ok(Self::with_components(
            Arc::new(db.root_dirs()),
            Arc::new(db.series()),
            Arc::new(db.episodes()),
            Arc::new(db.episode_files()),
            Arc::new(db.quality_profiles()),
            catalog,
            config,
        ))
    }

    // ----- root directory registry -----

    pub async fn list_root_dirs(&self) -> Result<Vec<RootDirRecord>> {
        self.root_dirs.list().await
    }

    /// Register a library root. The path must exist and be a directory;
    /// a bad root is a configuration fault and fails hard.
    pub async fn add_root_dir(&self, path: &str) -> Result<RootDirRecord> {
        let dir = Path::new(path);
        if !dir.is_dir() {
            bail!("root directory does not exist or is not a directory: {path}");
        }
        self.root_dirs.add(path).await
    }

    pub async fn remove_root_dir(&self, id: Uuid) -> Result<bool> {
        self.root_dirs.remove(id).await
    }

    // ----- series -----

    pub async fn list_all_series(&self) -> Result<Vec<SeriesRecord>> {
        self.series.list().await
    }

    pub async fn get_series(&self, id: Uuid) -> Result<Option<SeriesRecord>> {
        self.series.get(id).await
    }

    pub async fn update_series(
        &self,
        id: Uuid,
        update: UpdateSeries,
    ) -> Result<Option<SeriesRecord>> {
        self.series.update(id, update).await
    }

    /// Delete a series record along with its episode and file records.
    /// Files on disk are left alone.
    pub async fn delete_series(&self, id: Uuid) -> Result<bool> {
        let _section = self.locks.acquire(id).await;
        self.files.delete_by_series(id).await?;
        self.episodes.delete_by_series(id).await?;
        self.series.delete(id).await
    }

    pub async fn list_episodes(&self, series_id: Uuid) -> Result<Vec<EpisodeRecord>> {
        self.episodes.list_by_series(series_id).await
    }

    // ----- mapping -----

    pub async fn list_unmapped_folders(&self, path: &str) -> Result<Vec<UnmappedFolder>> {
        self.folder_scanner.list_unmapped_folders(Path::new(path)).await
    }

    pub async fn map_path_to_series(&self, path: &str) -> Option<CatalogCandidate> {
        self.folder_scanner.matcher().map_path_to_series(Path::new(path)).await
    }

    // ----- sync / import -----

    pub fn begin_sync_mapped(&self, mappings: Vec<SeriesMapping>) -> bool {
        self.sync.begin_sync_mapped(mappings)
    }

    pub fn begin_import_new(&self, dir: &str, external_id: i32, name: &str) -> bool {
        self.sync.begin_import_new(dir, external_id, name)
    }

    /// Whether a sync/import job is currently in flight
    pub fn is_sync_running(&self) -> bool {
        self.sync.is_running()
    }

    pub async fn refresh_episode_info(&self, series_id: Uuid) -> Result<()> {
        self.sync.refresh_episode_info(series_id).await
    }

    // ----- scanning -----

    pub async fn scan_series(&self, series_id: Uuid) -> Result<ScanSummary> {
        let series = self
            .series
            .get(series_id)
            .await?
            .context("series not found")?;

        let _section = self.locks.acquire(series_id).await;
        self.scanner.scan(&series).await
    }

    /// Remove episode-file records whose on-disk path no longer exists
    pub async fn clean_up(&self, files: Vec<EpisodeFileRecord>) -> Result<usize> {
        use std::collections::HashMap;

        let mut by_series: HashMap<Uuid, Vec<EpisodeFileRecord>> = HashMap::new();
        for file in files {
            by_series.entry(file.series_id).or_default().push(file);
        }

        let mut removed = 0;
        for (series_id, group) in by_series {
            let _section = self.locks.acquire(series_id).await;
            removed += self.scanner.clean_up(&group).await?;
        }
        Ok(removed)
    }

    /// Clean up stale records then rescan, holding the series lock across
    /// both so a rename cannot interleave.
    pub async fn rescan_series(&self, series_id: Uuid) -> Result<ScanSummary> {
        let series = self
            .series
            .get(series_id)
            .await?
            .context("series not found")?;

        let _section = self.locks.acquire(series_id).await;
        let existing = self.files.list_by_series(series_id).await?;
        self.scanner.clean_up(&existing).await?;
        self.scanner.scan(&series).await
    }

    pub async fn list_episode_files(&self) -> Result<Vec<EpisodeFileRecord>> {
        self.files.list().await
    }

    // ----- renaming -----

    pub async fn rename_all(&self) -> Result<Vec<RenameOutcome>> {
        self.renamer.rename_all().await
    }

    pub async fn rename_series(&self, series_id: Uuid) -> Result<Vec<RenameOutcome>> {
        self.renamer.rename_series(series_id).await
    }

    pub async fn rename_season(
        &self,
        series_id: Uuid,
        season_number: i32,
    ) -> Result<Vec<RenameOutcome>> {
        self.renamer.rename_season(series_id, season_number).await
    }

    pub async fn rename_episode(&self, episode_id: Uuid) -> Result<Vec<RenameOutcome>> {
        self.renamer.rename_episode(episode_id).await
    }

    // ----- profiles / helpers -----

    pub async fn list_profiles(&self) -> Result<Vec<QualityProfileRecord>> {
        self.profiles.list_profiles().await
    }

    /// Path of an episode file relative to its series folder; empty string
    /// for an absent file.
    pub fn relative_episode_path(
        &self,
        file: Option<&EpisodeFileRecord>,
        series: &SeriesRecord,
    ) -> String {
        relative_episode_path(file.map(|f| f.path.as_str()), &series.path)
    }
}
