//! Capability traits over persistence
//!
//! The engine depends on these traits only. Production implementations are
//! the SQLite repositories in [`crate::db`]; [`memory`] provides in-memory
//! implementations for tests.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::model::{
    CreateEpisodeFile, CreateSeries, EpisodeFileRecord, EpisodeRecord, QualityProfileRecord,
    RootDirRecord, SeriesRecord, UpdateSeries, UpsertEpisode,
};

pub use memory::{
    MemoryEpisodeFileStore, MemoryEpisodeStore, MemoryProfileStore, MemoryRootDirStore,
    MemorySeriesStore,
};

/// Registry of configured top-level library folders
#[async_trait]
pub trait RootDirStore: Send + Sync {
    async fn list(&self) -> Result<Vec<RootDirRecord>>;
    async fn get(&self, id: Uuid) -> Result<Option<RootDirRecord>>;
    async fn add(&self, path: &str) -> Result<RootDirRecord>;
    async fn remove(&self, id: Uuid) -> Result<bool>;
}

/// Series records
#[async_trait]
pub trait SeriesStore: Send + Sync {
    async fn list(&self) -> Result<Vec<SeriesRecord>>;
    async fn get(&self, id: Uuid) -> Result<Option<SeriesRecord>>;
    async fn get_by_path(&self, path: &str) -> Result<Option<SeriesRecord>>;
    async fn get_by_external_id(&self, external_id: i32) -> Result<Option<SeriesRecord>>;
    async fn create(&self, input: CreateSeries) -> Result<SeriesRecord>;
    async fn update(&self, id: Uuid, update: UpdateSeries) -> Result<Option<SeriesRecord>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// Episode records and their file associations
#[async_trait]
pub trait EpisodeStore: Send + Sync {
    async fn list_by_series(&self, series_id: Uuid) -> Result<Vec<EpisodeRecord>>;
    async fn get(&self, id: Uuid) -> Result<Option<EpisodeRecord>>;
    async fn get_by_number(
        &self,
        series_id: Uuid,
        season_number: i32,
        episode_number: i32,
    ) -> Result<Option<EpisodeRecord>>;
    async fn list_by_file(&self, file_id: Uuid) -> Result<Vec<EpisodeRecord>>;
    /// Insert or refresh an episode keyed on (series, season, episode).
    /// An existing file association survives the refresh.
    async fn upsert(&self, input: UpsertEpisode) -> Result<EpisodeRecord>;
    async fn set_episode_file(&self, episode_id: Uuid, file_id: Option<Uuid>) -> Result<()>;
    async fn detach_file(&self, file_id: Uuid) -> Result<()>;
    async fn delete_by_series(&self, series_id: Uuid) -> Result<u64>;
}

/// Tracked episode-file index
#[async_trait]
pub trait EpisodeFileStore: Send + Sync {
    async fn list(&self) -> Result<Vec<EpisodeFileRecord>>;
    async fn list_by_series(&self, series_id: Uuid) -> Result<Vec<EpisodeFileRecord>>;
    async fn list_by_season(
        &self,
        series_id: Uuid,
        season_number: i32,
    ) -> Result<Vec<EpisodeFileRecord>>;
    async fn get(&self, id: Uuid) -> Result<Option<EpisodeFileRecord>>;
    async fn get_by_path(&self, path: &str) -> Result<Option<EpisodeFileRecord>>;
    async fn create(&self, input: CreateEpisodeFile) -> Result<EpisodeFileRecord>;
    async fn update_path(&self, id: Uuid, path: &str) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn delete_by_series(&self, series_id: Uuid) -> Result<u64>;
}

/// Quality profile configuration store (read-only at this boundary)
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn list_profiles(&self) -> Result<Vec<QualityProfileRecord>>;
    async fn get_profile(&self, id: Uuid) -> Result<Option<QualityProfileRecord>>;
}
