//! Sync coordinator
//!
//! Single-flight orchestrator for importing series. Accepts a batch of
//! (path, external id) mappings or a single new-series import, refuses
//! overlapping jobs, and drives folder creation, catalog-detail fetch,
//! series-record commit and the initial file scan.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::catalog::CatalogClient;
use super::file_utils::sanitize_for_filename;
use super::locks::SeriesLockMap;
use super::scanner::EpisodeFileScanner;
use crate::model::{CreateSeries, UpsertEpisode};
use crate::store::{EpisodeStore, ProfileStore, SeriesStore};

/// One accepted folder-to-catalog mapping
#[derive(Debug, Clone)]
pub struct SeriesMapping {
    pub path: String,
    pub external_id: i32,
}

/// Clears the busy flag when the job finishes, however it finishes
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Single-flight sync/import orchestrator
pub struct SyncCoordinator {
    running: Arc<AtomicBool>,
    series: Arc<dyn SeriesStore>,
    episodes: Arc<dyn EpisodeStore>,
    profiles: Arc<dyn ProfileStore>,
    catalog: Arc<dyn CatalogClient>,
    scanner: Arc<EpisodeFileScanner>,
    locks: Arc<SeriesLockMap>,
}

impl SyncCoordinator {
    pub fn new(
        series: Arc<dyn SeriesStore>,
        episodes: Arc<dyn EpisodeStore>,
        profiles: Arc<dyn ProfileStore>,
        catalog: Arc<dyn CatalogClient>,
        scanner: Arc<EpisodeFileScanner>,
        locks: Arc<SeriesLockMap>,
    ) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            series,
            episodes,
            profiles,
            catalog,
            scanner,
            locks,
        }
    }

    /// Whether a sync/import job is currently in flight
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start a batch sync of accepted folder mappings.
    ///
    /// Returns `false` without mutating anything if a job is already
    /// running; `true` means the batch was dispatched. Mappings fail or
    /// succeed independently of each other.
    pub fn begin_sync_mapped(self: &Arc<Self>, mappings: Vec<SeriesMapping>) -> bool {
        let Some(guard) = self.try_claim() else {
            info!("Sync already in progress, rejecting new batch");
            return false;
        };

        let coordinator = self.clone();
        tokio::spawn(async move {
            let _guard = guard;
            coordinator.run_mappings(mappings).await;
        });

        true
    }

    /// Start importing a brand-new series into `dir`.
    ///
    /// Creates the target folder if absent, then runs the same
    /// fetch-commit-scan pipeline as a mapped sync.
    pub fn begin_import_new(self: &Arc<Self>, dir: &str, external_id: i32, name: &str) -> bool {
        let Some(guard) = self.try_claim() else {
            info!("Sync already in progress, rejecting new-series import");
            return false;
        };

        let coordinator = self.clone();
        let dir = dir.to_string();
        let name = name.to_string();
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = coordinator.run_import_new(&dir, external_id, &name).await {
                error!(dir = %dir, external_id = external_id, error = %e, "New-series import failed");
            }
        });

        true
    }

    /// Re-fetch episode records from the catalog for a tracked series.
    ///
    /// Existing file associations survive the refresh.
    pub async fn refresh_episode_info(&self, series_id: Uuid) -> Result<()> {
        let series = self
            .series
            .get(series_id)
            .await?
            .context("series not found")?;

        let detail = self.catalog.fetch_detail(series.external_id).await?;
        let count = detail.episodes.len();

        for episode in detail.episodes {
            self.episodes
                .upsert(UpsertEpisode {
                    series_id: series.id,
                    season_number: episode.season_number,
                    episode_number: episode.episode_number,
                    title: episode.title,
                    overview: episode.overview,
                    air_date: episode.air_date,
                })
                .await?;
        }

        info!(series = %series.name, episodes = count, "Refreshed episode info");
        Ok(())
    }

    /// Atomically claim the busy flag; `None` means another job holds it
    fn try_claim(&self) -> Option<RunningGuard> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        Some(RunningGuard(self.running.clone()))
    }

    async fn run_mappings(&self, mappings: Vec<SeriesMapping>) {
        let total = mappings.len();
        let mut imported = 0usize;
        let mut skipped = 0usize;
        let mut failed = 0usize;

        for mapping in mappings {
            // An unresolved mapping slipping through the UI is an operator
            // mistake, not a fault; surface it and move on.
            if mapping.external_id < 1 {
                warn!(path = %mapping.path, "Mapping has no catalog id, skipping");
                skipped += 1;
                continue;
            }

            match self.import_series(&mapping.path, mapping.external_id).await {
                Ok(()) => imported += 1,
                Err(e) => {
                    error!(path = %mapping.path, external_id = mapping.external_id, error = %e, "Mapping failed");
                    failed += 1;
                }
            }
        }

        info!(
            total = total,
            imported = imported,
            skipped = skipped,
            failed = failed,
            "Sync batch completed"
        );
    }

    async fn run_import_new(&self, dir: &str, external_id: i32, name: &str) -> Result<()> {
        let folder = Path::new(dir).join(sanitize_for_filename(name));

        if !folder.exists() {
            tokio::fs::create_dir_all(&folder)
                .await
                .with_context(|| format!("failed to create series folder {}", folder.display()))?;
            info!(path = %folder.display(), "Created series folder");
        }

        self.import_series(&folder.to_string_lossy(), external_id)
            .await
    }

    /// Fetch catalog detail, commit the series and its episodes, then run
    /// the initial scan.
    async fn import_series(&self, path: &str, external_id: i32) -> Result<()> {
        if self.series.get_by_path(path).await?.is_some() {
            bail!("path already tracked by another series: {path}");
        }

        let detail = self
            .catalog
            .fetch_detail(external_id)
            .await
            .context("catalog fetch failed")?;

        let default_profile = self.profiles.list_profiles().await?.into_iter().next();

        let series = self
            .series
            .create(CreateSeries {
                external_id,
                name: detail.name.clone(),
                path: path.to_string(),
                overview: detail.overview,
                status: detail.status,
                first_aired: detail.first_aired,
                quality_profile_id: default_profile.map(|p| p.id),
                monitored: true,
            })
            .await?;

        for episode in detail.episodes {
            self.episodes
                .upsert(UpsertEpisode {
                    series_id: series.id,
                    season_number: episode.season_number,
                    episode_number: episode.episode_number,
                    title: episode.title,
                    overview: episode.overview,
                    air_date: episode.air_date,
                })
                .await?;
        }

        info!(series = %series.name, path = %series.path, "Committed series record");

        let _section = self.locks.acquire(series.id).await;
        self.scanner.scan(&series).await?;

        Ok(())
    }
}
