//! Domain records shared by the store traits and their implementations

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use uuid::Uuid;

/// Configured top-level library folder
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RootDirRecord {
    pub id: Uuid,
    pub path: String,
}

/// Series record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SeriesRecord {
    pub id: Uuid,
    pub external_id: i32,
    pub name: String,
    pub path: String,
    pub overview: Option<String>,
    pub status: Option<String>,
    pub first_aired: Option<NaiveDate>,
    pub quality_profile_id: Option<Uuid>,
    pub monitored: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a series (only the sync coordinator commits these)
#[derive(Debug, Clone)]
pub struct CreateSeries {
    pub external_id: i32,
    pub name: String,
    pub path: String,
    pub overview: Option<String>,
    pub status: Option<String>,
    pub first_aired: Option<NaiveDate>,
    pub quality_profile_id: Option<Uuid>,
    pub monitored: bool,
}

/// Input for updating a series; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateSeries {
    pub name: Option<String>,
    pub path: Option<String>,
    pub overview: Option<String>,
    pub status: Option<String>,
    pub monitored: Option<bool>,
    pub quality_profile_id: Option<Option<Uuid>>,
}

/// Episode record, sourced from the external catalog
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EpisodeRecord {
    pub id: Uuid,
    pub series_id: Uuid,
    pub season_number: i32,
    pub episode_number: i32,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<NaiveDate>,
    /// Link to the tracked file that holds this episode, if any.
    /// Association is keyed by file id so renames cannot sever it.
    pub episode_file_id: Option<Uuid>,
}

/// Input for upserting an episode from the catalog
#[derive(Debug, Clone)]
pub struct UpsertEpisode {
    pub series_id: Uuid,
    pub season_number: i32,
    pub episode_number: i32,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<NaiveDate>,
}

/// Tracked media file on disk, owned by the series whose path it lives under
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EpisodeFileRecord {
    pub id: Uuid,
    pub series_id: Uuid,
    pub season_number: i32,
    pub path: String,
    pub quality: Option<String>,
    pub size_bytes: i64,
    pub date_added: DateTime<Utc>,
}

/// Input for tracking a newly discovered file
#[derive(Debug, Clone)]
pub struct CreateEpisodeFile {
    pub series_id: Uuid,
    pub season_number: i32,
    pub path: String,
    pub quality: Option<String>,
    pub size_bytes: i64,
}

/// Quality profile record; configured elsewhere, the engine only lists them
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QualityProfileRecord {
    pub id: Uuid,
    pub name: String,
    pub cutoff: String,
    pub allowed: Json<Vec<String>>,
}
