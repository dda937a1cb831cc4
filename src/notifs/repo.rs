use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Notification posted by an admin for all users.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminNotif {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "AdNotif")]
    pub ad_notif: String,
    pub title: Option<String>,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait NotifRepo: Send + Sync {
    async fn create(&self, ad_notif: &str, title: Option<&str>) -> anyhow::Result<AdminNotif>;
    /// Newest first.
    async fn list(&self) -> anyhow::Result<Vec<AdminNotif>>;
    async fn latest(&self) -> anyhow::Result<Option<AdminNotif>>;
    /// A `None` title keeps the stored one.
    async fn update(
        &self,
        id: Uuid,
        ad_notif: &str,
        title: Option<&str>,
    ) -> anyhow::Result<Option<AdminNotif>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<AdminNotif>>;
}

#[derive(Clone)]
pub struct PgNotifRepo {
    db: PgPool,
}

impl PgNotifRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotifRepo for PgNotifRepo {
    async fn create(&self, ad_notif: &str, title: Option<&str>) -> anyhow::Result<AdminNotif> {
        sqlx::query_as::<_, AdminNotif>(
            r#"
            INSERT INTO admin_notifs (id, ad_notif, title)
            VALUES ($1, $2, $3)
            RETURNING id, ad_notif, title, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(ad_notif)
        .bind(title)
        .fetch_one(&self.db)
        .await
        .context("insert notif")
    }

    async fn list(&self) -> anyhow::Result<Vec<AdminNotif>> {
        sqlx::query_as::<_, AdminNotif>(
            r#"
            SELECT id, ad_notif, title, created_at
              FROM admin_notifs
             ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list notifs")
    }

    async fn latest(&self) -> anyhow::Result<Option<AdminNotif>> {
        sqlx::query_as::<_, AdminNotif>(
            r#"
            SELECT id, ad_notif, title, created_at
              FROM admin_notifs
             ORDER BY created_at DESC
             LIMIT 1
            "#,
        )
        .fetch_optional(&self.db)
        .await
        .context("latest notif")
    }

    async fn update(
        &self,
        id: Uuid,
        ad_notif: &str,
        title: Option<&str>,
    ) -> anyhow::Result<Option<AdminNotif>> {
        sqlx::query_as::<_, AdminNotif>(
            r#"
            UPDATE admin_notifs
               SET ad_notif = $2,
                   title    = COALESCE($3, title)
             WHERE id = $1
            RETURNING id, ad_notif, title, created_at
            "#,
        )
        .bind(id)
        .bind(ad_notif)
        .bind(title)
        .fetch_optional(&self.db)
        .await
        .context("update notif")
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<AdminNotif>> {
        sqlx::query_as::<_, AdminNotif>(
            r#"
            DELETE FROM admin_notifs
             WHERE id = $1
            RETURNING id, ad_notif, title, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("delete notif")
    }
}
