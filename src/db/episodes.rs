//! Episode database repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::model::{EpisodeRecord, UpsertEpisode};
use crate::store::EpisodeStore;

pub struct EpisodeRepository {
    pool: SqlitePool,
}

impl EpisodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const EPISODE_COLUMNS: &str =
    "id, series_id, season_number, episode_number, title, overview, air_date, episode_file_id";

#[async_trait]
impl EpisodeStore for EpisodeRepository {
    async fn list_by_series(&self, series_id: Uuid) -> Result<Vec<EpisodeRecord>> {
        let records = sqlx::query_as::<_, EpisodeRecord>(&format!(
            "SELECT {EPISODE_COLUMNS} FROM episodes WHERE series_id = ? \
             ORDER BY season_number, episode_number"
        ))
        .bind(series_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn get(&self, id: Uuid) -> Result<Option<EpisodeRecord>> {
        let record = sqlx::query_as::<_, EpisodeRecord>(&format!(
            "SELECT {EPISODE_COLUMNS} FROM episodes WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get_by_number(
        &self,
        series_id: Uuid,
        season_number: i32,
        episode_number: i32,
    ) -> Result<Option<EpisodeRecord>> {
        let record = sqlx::query_as::<_, EpisodeRecord>(&format!(
            "SELECT {EPISODE_COLUMNS} FROM episodes \
             WHERE series_id = ? AND season_number = ? AND episode_number = ?"
        ))
        .bind(series_id)
        .bind(season_number)
        .bind(episode_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_by_file(&self, file_id: Uuid) -> Result<Vec<EpisodeRecord>> {
        let records = sqlx::query_as::<_, EpisodeRecord>(&format!(
            "SELECT {EPISODE_COLUMNS} FROM episodes WHERE episode_file_id = ? \
             ORDER BY season_number, episode_number"
        ))
        .bind(file_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Insert or refresh an episode keyed on (series, season, episode).
    /// An existing file association survives the refresh.
    async fn upsert(&self, input: UpsertEpisode) -> Result<EpisodeRecord> {
        sqlx::query(
            r#"
            INSERT INTO episodes (id, series_id, season_number, episode_number,
                                  title, overview, air_date, episode_file_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, NULL)
            ON CONFLICT(series_id, season_number, episode_number)
            DO UPDATE SET title = excluded.title,
                          overview = excluded.overview,
                          air_date = excluded.air_date
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.series_id)
        .bind(input.season_number)
        .bind(input.episode_number)
        .bind(&input.title)
        .bind(&input.overview)
        .bind(input.air_date)
        .execute(&self.pool)
        .await?;

        let record = self
            .get_by_number(input.series_id, input.season_number, input.episode_number)
            .await?
            .context("episode row missing after upsert")?;

        Ok(record)
    }

    async fn set_episode_file(&self, episode_id: Uuid, file_id: Option<Uuid>) -> Result<()> {
        sqlx::query("UPDATE episodes SET episode_file_id = ? WHERE id = ?")
            .bind(file_id)
            .bind(episode_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn detach_file(&self, file_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE episodes SET episode_file_id = NULL WHERE episode_file_id = ?")
            .bind(file_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_by_series(&self, series_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM episodes WHERE series_id = ?")
            .bind(series_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
