//! Series database repository

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::model::{CreateSeries, SeriesRecord, UpdateSeries};
use crate::store::SeriesStore;

pub struct SeriesRepository {
    pool: SqlitePool,
}

impl SeriesRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const SERIES_COLUMNS: &str = "id, external_id, name, path, overview, status, first_aired, \
     quality_profile_id, monitored, created_at, updated_at";

#[async_trait]
impl SeriesStore for SeriesRepository {
    async fn list(&self) -> Result<Vec<SeriesRecord>> {
        let records = sqlx::query_as::<_, SeriesRecord>(&format!(
            "SELECT {SERIES_COLUMNS} FROM series ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn get(&self, id: Uuid) -> Result<Option<SeriesRecord>> {
        let record = sqlx::query_as::<_, SeriesRecord>(&format!(
            "SELECT {SERIES_COLUMNS} FROM series WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get_by_path(&self, path: &str) -> Result<Option<SeriesRecord>> {
        let record = sqlx::query_as::<_, SeriesRecord>(&format!(
            "SELECT {SERIES_COLUMNS} FROM series WHERE path = ?"
        ))
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get_by_external_id(&self, external_id: i32) -> Result<Option<SeriesRecord>> {
        let record = sqlx::query_as::<_, SeriesRecord>(&format!(
            "SELECT {SERIES_COLUMNS} FROM series WHERE external_id = ?"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn create(&self, input: CreateSeries) -> Result<SeriesRecord> {
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

        sqlx::query(
            r#"
            INSERT INTO series (id, external_id, name, path, overview, status, first_aired,
                                quality_profile_id, monitored, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id)
        .bind(record.external_id)
        .bind(&record.name)
        .bind(&record.path)
        .bind(&record.overview)
        .bind(&record.status)
        .bind(record.first_aired)
        .bind(record.quality_profile_id)
        .bind(record.monitored)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update(&self, id: Uuid, update: UpdateSeries) -> Result<Option<SeriesRecord>> {
        let Some(mut record) = self.get(id).await? else {
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

        sqlx::query(
            r#"
            UPDATE series
            SET name = ?, path = ?, overview = ?, status = ?, monitored = ?,
                quality_profile_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&record.name)
        .bind(&record.path)
        .bind(&record.overview)
        .bind(&record.status)
        .bind(record.monitored)
        .bind(record.quality_profile_id)
        .bind(record.updated_at)
        .bind(record.id)
        .execute(&self.pool)
        .await?;

        Ok(Some(record))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM series WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
