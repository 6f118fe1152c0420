//! Quality profile repository
//!
//! Profiles are configured elsewhere; the engine only lists them and assigns
//! a default to newly imported series.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::model::QualityProfileRecord;
use crate::store::ProfileStore;

pub struct QualityProfileRepository {
    pool: SqlitePool,
}

impl QualityProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the stock profiles on first run
    pub async fn seed_defaults(&self) -> Result<()> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quality_profiles")
            .fetch_one(&self.pool)
            .await?;

        if count > 0 {
            return Ok(());
        }

        let defaults: &[(&str, &str, &[&str])] = &[
            ("Any", "720p", &["480p", "720p", "1080p", "2160p"]),
            ("HD", "1080p", &["720p", "1080p"]),
        ];

        for (name, cutoff, allowed) in defaults.iter().copied() {
            let allowed: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();
            sqlx::query(
                "INSERT INTO quality_profiles (id, name, cutoff, allowed) VALUES (?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(cutoff)
            .bind(Json(allowed))
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl ProfileStore for QualityProfileRepository {
    async fn list_profiles(&self) -> Result<Vec<QualityProfileRecord>> {
        let records = sqlx::query_as::<_, QualityProfileRecord>(
            "SELECT id, name, cutoff, allowed FROM quality_profiles ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<QualityProfileRecord>> {
        let record = sqlx::query_as::<_, QualityProfileRecord>(
            "SELECT id, name, cutoff, allowed FROM quality_profiles WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}
