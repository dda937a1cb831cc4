use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// One knowledge-base entry fed to the chat as context.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InfoEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub info: String,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait InfoRepo: Send + Sync {
    async fn create(&self, info: &str) -> anyhow::Result<InfoEntry>;
    /// Newest first.
    async fn list(&self) -> anyhow::Result<Vec<InfoEntry>>;
    async fn update(&self, id: Uuid, info: &str) -> anyhow::Result<Option<InfoEntry>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<InfoEntry>>;
}

#[derive(Clone)]
pub struct PgInfoRepo {
    db: PgPool,
}

impl PgInfoRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InfoRepo for PgInfoRepo {
    async fn create(&self, info: &str) -> anyhow::Result<InfoEntry> {
        sqlx::query_as::<_, InfoEntry>(
            "INSERT INTO info_entries (id, info) VALUES ($1, $2) RETURNING id, info, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(info)
        .fetch_one(&self.db)
        .await
        .context("insert info")
    }

    async fn list(&self) -> anyhow::Result<Vec<InfoEntry>> {
        sqlx::query_as::<_, InfoEntry>(
            "SELECT id, info, created_at FROM info_entries ORDER BY created_at DESC",
        )
        .fetch_all(&self.db)
        .await
        .context("list info")
    }

    async fn update(&self, id: Uuid, info: &str) -> anyhow::Result<Option<InfoEntry>> {
        sqlx::query_as::<_, InfoEntry>(
            "UPDATE info_entries SET info = $2 WHERE id = $1 RETURNING id, info, created_at",
        )
        .bind(id)
        .bind(info)
        .fetch_optional(&self.db)
        .await
        .context("update info")
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<InfoEntry>> {
        sqlx::query_as::<_, InfoEntry>(
            "DELETE FROM info_entries WHERE id = $1 RETURNING id, info, created_at",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("delete info")
    }
}
