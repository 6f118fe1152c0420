//! In-memory store implementations
//!
//! Used by tests and available to embedders that do not want a database.
//! Semantics match the SQLite repositories, including unique-path
//! constraints and association behavior.

use std::collections::HashMap;

use anyhow::{Result, bail};
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::model::{
    CreateEpisodeFile, CreateSeries, EpisodeFileRecord, EpisodeRecord, QualityProfileRecord,
    RootDirRecord, SeriesRecord, UpdateSeries, UpsertEpisode,
};
use crate::store::{
    EpisodeFileStore, EpisodeStore, ProfileStore, RootDirStore, SeriesStore,
};
use async_trait::async_trait;

#[derive(Default)]
pub struct MemoryRootDirStore {
    dirs: RwLock<HashMap<Uuid, RootDirRecord>>,
}

impl MemoryRootDirStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RootDirStore for MemoryRootDirStore {
    async fn list(&self) -> Result<Vec<RootDirRecord>> {
        let mut dirs: Vec<_> = self.dirs.read().values().cloned().collect();
        dirs.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(dirs)
    }

    async fn get(&self, id: Uuid) -> Result<Option<RootDirRecord>> {
        Ok(self.dirs.read().get(&id).cloned())
    }

    async fn add(&self, path: &str) -> Result<RootDirRecord> {
        let mut dirs = self.dirs.write();
        if dirs.values().any(|d| d.path == path) {
            bail!("root directory already registered: {path}");
        }
        let record = RootDirRecord {
            id: Uuid::new_v4(),
            path: path.to_string(),
        };
        dirs.insert(record.id, record.clone());
        Ok(record)
    }

    async fn remove(&self, id: Uuid) -> Result<bool> {
        Ok(self.dirs.write().remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemorySeriesStore {
    series: RwLock<HashMap<Uuid, SeriesRecord>>,
}

impl MemorySeriesStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SeriesStore for MemorySeriesStore {
    async fn list(&self) -> Result<Vec<SeriesRecord>> {
        let mut all: Vec<_> = self.series.read().values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn get(&self, id: Uuid) -> Result<Option<SeriesRecord>> {
        Ok(self.series.read().get(&id).cloned())
    }

    async fn get_by_path(&self, path: &str) -> Result<Option<SeriesRecord>> {
        Ok(self
            .series
            .read()
            .values()
            .find(|s| s.path == path)
            .cloned())
    }

    async fn get_by_external_id(&self, external_id: i32) -> Result<Option<SeriesRecord>> {
        Ok(self
            .series
            .read()
            .values()
            .find(|s| s.external_id == external_id)
            .cloned())
    }

    async fn create(&self, input: CreateSeries) -> Result<SeriesRecord> {
        let mut series = self.series.write();
        if series.values().any(|s| s.path == input.path) {
            bail!("series path already tracked: {}", input.path);
        }
        let now = Utc::now();
        let record = SeriesRecord {
            id: Uuid::new_v4(),
            external_id: input.external_id,
            name: input.name,
            path: input.path,
            overview: input.overview,
            status: input.status,
            first_aired: input.first_aired,
            quality_profile_id: input.quality_profile_id,
            monitored: input.monitored,
            created_at: now,
            updated_at: now,
        };
        series.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: Uuid, update: UpdateSeries) -> Result<Option<SeriesRecord>> {
        let mut series = self.series.write();
        let Some(record) = series.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            record.name = name;
        }
        if let Some(path) = update.path {
            record.path = path;
        }
        if let Some(overview) = update.overview {
            record.overview = Some(overview);
        }
        if let Some(status) = update.status {
            record.status = Some(status);
        }
        if let Some(monitored) = update.monitored {
            record.monitored = monitored;
        }
        if let Some(profile) = update.quality_profile_id {
            record.quality_profile_id = profile;
        }
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.series.write().remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryEpisodeStore {
    episodes: RwLock<HashMap<Uuid, EpisodeRecord>>,
}

impl MemoryEpisodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EpisodeStore for MemoryEpisodeStore {
    async fn list_by_series(&self, series_id: Uuid) -> Result<Vec<EpisodeRecord>> {
        let mut eps: Vec<_> = self
            .episodes
            .read()
            .values()
            .filter(|e| e.series_id == series_id)
            .cloned()
            .collect();
        eps.sort_by_key(|e| (e.season_number, e.episode_number));
        Ok(eps)
    }

    async fn get(&self, id: Uuid) -> Result<Option<EpisodeRecord>> {
        Ok(self.episodes.read().get(&id).cloned())
    }

    async fn get_by_number(
        &self,
        series_id: Uuid,
        season_number: i32,
        episode_number: i32,
    ) -> Result<Option<EpisodeRecord>> {
        Ok(self
            .episodes
            .read()
            .values()
            .find(|e| {
                e.series_id == series_id
                    && e.season_number == season_number
                    && e.episode_number == episode_number
            })
            .cloned())
    }

    async fn list_by_file(&self, file_id: Uuid) -> Result<Vec<EpisodeRecord>> {
        let mut eps: Vec<_> = self
            .episodes
            .read()
            .values()
            .filter(|e| e.episode_file_id == Some(file_id))
            .cloned()
            .collect();
        eps.sort_by_key(|e| (e.season_number, e.episode_number));
        Ok(eps)
    }

    async fn upsert(&self, input: UpsertEpisode) -> Result<EpisodeRecord> {
        let mut episodes = self.episodes.write();
        let existing = episodes.values_mut().find(|e| {
            e.series_id == input.series_id
                && e.season_number == input.season_number
                && e.episode_number == input.episode_number
        });
        if let Some(record) = existing {
            record.title = input.title;
            record.overview = input.overview;
            record.air_date = input.air_date;
            return Ok(record.clone());
        }
        let record = EpisodeRecord {
            id: Uuid::new_v4(),
            series_id: input.series_id,
            season_number: input.season_number,
            episode_number: input.episode_number,
            title: input.title,
            overview: input.overview,
            air_date: input.air_date,
            episode_file_id: None,
        };
        episodes.insert(record.id, record.clone());
        Ok(record)
    }

    async fn set_episode_file(&self, episode_id: Uuid, file_id: Option<Uuid>) -> Result<()> {
        if let Some(record) = self.episodes.write().get_mut(&episode_id) {
            record.episode_file_id = file_id;
        }
        Ok(())
    }

    async fn detach_file(&self, file_id: Uuid) -> Result<()> {
        for record in self.episodes.write().values_mut() {
            if record.episode_file_id == Some(file_id) {
                record.episode_file_id = None;
            }
        }
        Ok(())
    }

    async fn delete_by_series(&self, series_id: Uuid) -> Result<u64> {
        let mut episodes = self.episodes.write();
        let before = episodes.len();
        episodes.retain(|_, e| e.series_id != series_id);
        Ok((before - episodes.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryEpisodeFileStore {
    files: RwLock<HashMap<Uuid, EpisodeFileRecord>>,
}

impl MemoryEpisodeFileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EpisodeFileStore for MemoryEpisodeFileStore {
    async fn list(&self) -> Result<Vec<EpisodeFileRecord>> {
        let mut all: Vec<_> = self.files.read().values().cloned().collect();
        all.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(all)
    }

    async fn list_by_series(&self, series_id: Uuid) -> Result<Vec<EpisodeFileRecord>> {
        let mut all: Vec<_> = self
            .files
            .read()
            .values()
            .filter(|f| f.series_id == series_id)
            .cloned()
            .collect();
        all.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(all)
    }

    async fn list_by_season(
        &self,
        series_id: Uuid,
        season_number: i32,
    ) -> Result<Vec<EpisodeFileRecord>> {
        let mut all: Vec<_> = self
            .files
            .read()
            .values()
            .filter(|f| f.series_id == series_id && f.season_number == season_number)
            .cloned()
            .collect();
        all.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(all)
    }

    async fn get(&self, id: Uuid) -> Result<Option<EpisodeFileRecord>> {
        Ok(self.files.read().get(&id).cloned())
    }

    async fn get_by_path(&self, path: &str) -> Result<Option<EpisodeFileRecord>> {
        Ok(self.files.read().values().find(|f| f.path == path).cloned())
    }

    async fn create(&self, input: CreateEpisodeFile) -> Result<EpisodeFileRecord> {
        let mut files = self.files.write();
        if files.values().any(|f| f.path == input.path) {
            bail!("episode file already tracked: {}", input.path);
        }
        let record = EpisodeFileRecord {
            id: Uuid::new_v4(),
            series_id: input.series_id,
            season_number: input.season_number,
            path: input.path,
            quality: input.quality,
            size_bytes: input.size_bytes,
            date_added: Utc::now(),
        };
        files.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_path(&self, id: Uuid, path: &str) -> Result<()> {
        if let Some(record) = self.files.write().get_mut(&id) {
            record.path = path.to_string();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.files.write().remove(&id).is_some())
    }

    async fn delete_by_series(&self, series_id: Uuid) -> Result<u64> {
        let mut files = self.files.write();
        let before = files.len();
        files.retain(|_, f| f.series_id != series_id);
        Ok((before - files.len()) as u64)
    }
}

/// Fixed set of profiles, seeded at construction
pub struct MemoryProfileStore {
    profiles: Vec<QualityProfileRecord>,
}

impl MemoryProfileStore {
    pub fn new(profiles: Vec<QualityProfileRecord>) -> Self {
        Self { profiles }
    }

    /// The stock profiles the SQLite store seeds on first run
    pub fn with_defaults() -> Self {
        use sqlx::types::Json;
        let defaults = vec![
            QualityProfileRecord {
                id: Uuid::new_v4(),
                name: "Any".to_string(),
                cutoff: "720p".to_string(),
                allowed: Json(vec![
                    "480p".to_string(),
                    "720p".to_string(),
                    "1080p".to_string(),
                    "2160p".to_string(),
                ]),
            },
            QualityProfileRecord {
                id: Uuid::new_v4(),
                name: "HD".to_string(),
                cutoff: "1080p".to_string(),
                allowed: Json(vec!["720p".to_string(), "1080p".to_string()]),
            },
        ];
        Self::new(defaults)
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn list_profiles(&self) -> Result<Vec<QualityProfileRecord>> {
        Ok(self.profiles.clone())
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<QualityProfileRecord>> {
        Ok(self.profiles.iter().find(|p| p.id == id).cloned())
    }
}
