//! Database connection and repositories
//!
//! SQLite-backed production implementations of the engine's store traits.
//! Each repository lives in its own module and is reached through the
//! [`Database`] wrapper.

pub mod episode_files;
pub mod episodes;
pub mod quality_profiles;
pub mod root_dirs;
pub mod series;

use std::str::FromStr;

use anyhow::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use episode_files::EpisodeFileRepository;
pub use episodes::EpisodeRepository;
pub use quality_profiles::QualityProfileRepository;
pub use root_dirs::RootDirRepository;
pub use series::SeriesRepository;

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database at `path` and bootstrap the schema
    pub async fn connect(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn root_dirs(&self) -> RootDirRepository {
        RootDirRepository::new(self.pool.clone())
    }

    pub fn series(&self) -> SeriesRepository {
        SeriesRepository::new(self.pool.clone())
    }

    pub fn episodes(&self) -> EpisodeRepository {
        EpisodeRepository::new(self.pool.clone())
    }

    pub fn episode_files(&self) -> EpisodeFileRepository {
        EpisodeFileRepository::new(self.pool.clone())
    }

    pub fn quality_profiles(&self) -> QualityProfileRepository {
        QualityProfileRepository::new(self.pool.clone())
    }

    /// Create tables if they do not exist and seed default quality profiles
    async fn init_schema(&self) -> Result<()> {
        sqlx::raw_sql(
            r#"
            CREATE TABLE IF NOT EXISTS root_dirs (
                id TEXT PRIMARY KEY,
                path TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS quality_profiles (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                cutoff TEXT NOT NULL,
                allowed TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS series (
                id TEXT PRIMARY KEY,
                external_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                path TEXT NOT NULL UNIQUE,
                overview TEXT,
                status TEXT,
                first_aired TEXT,
                quality_profile_id TEXT REFERENCES quality_profiles(id),
                monitored INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS episodes (
                id TEXT PRIMARY KEY,
                series_id TEXT NOT NULL REFERENCES series(id) ON DELETE CASCADE,
                season_number INTEGER NOT NULL,
                episode_number INTEGER NOT NULL,
                title TEXT,
                overview TEXT,
                air_date TEXT,
                episode_file_id TEXT,
                UNIQUE(series_id, season_number, episode_number)
            );

            CREATE TABLE IF NOT EXISTS episode_files (
                id TEXT PRIMARY KEY,
                series_id TEXT NOT NULL REFERENCES series(id) ON DELETE CASCADE,
                season_number INTEGER NOT NULL,
                path TEXT NOT NULL UNIQUE,
                quality TEXT,
                size_bytes INTEGER NOT NULL DEFAULT 0,
                date_added TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        self.quality_profiles().seed_defaults().await?;

        Ok(())
    }
}
