//! Root directory registry repository

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::model::RootDirRecord;
use crate::store::RootDirStore;

pub struct RootDirRepository {
    pool: SqlitePool,
}

impl RootDirRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RootDirStore for RootDirRepository {
    async fn list(&self) -> Result<Vec<RootDirRecord>> {
        let records = sqlx::query_as::<_, RootDirRecord>(
            "SELECT id, path FROM root_dirs ORDER BY path",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn get(&self, id: Uuid) -> Result<Option<RootDirRecord>> {
        let record = sqlx::query_as::<_, RootDirRecord>(
            "SELECT id, path FROM root_dirs WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn add(&self, path: &str) -> Result<RootDirRecord> {
        let record = RootDirRecord {
            id: Uuid::new_v4(),
            path: path.to_string(),
        };

        sqlx::query("INSERT INTO root_dirs (id, path) VALUES (?, ?)")
            .bind(record.id)
            .bind(&record.path)
            .execute(&self.pool)
            .await?;

        Ok(record)
    }

    async fn remove(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM root_dirs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
