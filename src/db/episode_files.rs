//! Episode file index repository

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::model::{CreateEpisodeFile, EpisodeFileRecord};
use crate::store::EpisodeFileStore;

pub struct EpisodeFileRepository {
    pool: SqlitePool,
}

impl EpisodeFileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const FILE_COLUMNS: &str = "id, series_id, season_number, path, quality, size_bytes, date_added";

#[async_trait]
impl EpisodeFileStore for EpisodeFileRepository {
    async fn list(&self) -> Result<Vec<EpisodeFileRecord>> {
        let records = sqlx::query_as::<_, EpisodeFileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM episode_files ORDER BY path"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn list_by_series(&self, series_id: Uuid) -> Result<Vec<EpisodeFileRecord>> {
        let records = sqlx::query_as::<_, EpisodeFileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM episode_files WHERE series_id = ? ORDER BY path"
        ))
        .bind(series_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn list_by_season(
        &self,
        series_id: Uuid,
        season_number: i32,
    ) -> Result<Vec<EpisodeFileRecord>> {
        let records = sqlx::query_as::<_, EpisodeFileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM episode_files \
             WHERE series_id = ? AND season_number = ? ORDER BY path"
        ))
        .bind(series_id)
        .bind(season_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn get(&self, id: Uuid) -> Result<Option<EpisodeFileRecord>> {
        let record = sqlx::query_as::<_, EpisodeFileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM episode_files WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get_by_path(&self, path: &str) -> Result<Option<EpisodeFileRecord>> {
        let record = sqlx::query_as::<_, EpisodeFileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM episode_files WHERE path = ?"
        ))
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn create(&self, input: CreateEpisodeFile) -> Result<EpisodeFileRecord> {
        let record = EpisodeFileRecord {
            id: Uuid::new_v4(),
            series_id: input.series_id,
            season_number: input.season_number,
            path: input.path,
            quality: input.quality,
            size_bytes: input.size_bytes,
            date_added: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO episode_files (id, series_id, season_number, path, quality,
                                       size_bytes, date_added)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id)
        .bind(record.series_id)
        .bind(record.season_number)
        .bind(&record.path)
        .bind(&record.quality)
        .bind(record.size_bytes)
        .bind(record.date_added)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update_path(&self, id: Uuid, path: &str) -> Result<()> {
        sqlx::query("UPDATE episode_files SET path = ? WHERE id = ?")
            .bind(path)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM episode_files WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_series(&self, series_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM episode_files WHERE series_id = ?")
            .bind(series_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
