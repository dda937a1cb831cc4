use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::repo_types::{
    GoogleProfile, NewTask, NewUser, Task, TaskRow, TaskStatus, User, UserUpdate, STATUS_ACTIVE,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Credential store. Email uniqueness is enforced by the implementation,
/// not by callers.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// First user with this name in creation order.
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<User>>;
    /// All users, newest first. Tasks are not loaded.
    async fn list_accounts(&self) -> anyhow::Result<Vec<User>>;
    async fn create(&self, new: NewUser) -> Result<User, RepoError>;
    /// Insert-or-update keyed by email, atomic at the store.
    async fn upsert_google(&self, profile: &GoogleProfile) -> anyhow::Result<User>;
    async fn update(&self, id: Uuid, update: &UserUpdate) -> Result<Option<User>, RepoError>;
    async fn update_by_name(
        &self,
        name: &str,
        update: &UserUpdate,
    ) -> Result<Option<User>, RepoError>;
    async fn push_task(&self, user_id: Uuid, task: NewTask) -> anyhow::Result<Option<User>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<User>>;
}

const USER_COLUMNS: &str = "id, email, name, password_hash, google_id, role, status, \
    buddy_name, buddy_url, picture, department, position, created_at, updated_at";

const UPDATE_SET: &str = r#"
    name       = COALESCE($2, name),
    email      = COALESCE($3, email),
    role       = COALESCE($4, role),
    status     = COALESCE($5, status),
    picture    = COALESCE($6, picture),
    buddy_url  = COALESCE($7, buddy_url),
    buddy_name = COALESCE($8, buddy_name),
    department = COALESCE($9, department),
    position   = COALESCE($10, position),
    updated_at = now()
"#;

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn tasks_for(&self, user_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, Vec<Task>>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, user_id, title, datetime, status
              FROM tasks
             WHERE user_id = ANY($1)
             ORDER BY seq ASC
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.db)
        .await
        .context("load tasks")?;

        let mut by_user: HashMap<Uuid, Vec<Task>> = HashMap::new();
        for row in rows {
            by_user.entry(row.user_id).or_default().push(row.into());
        }
        Ok(by_user)
    }

    async fn with_tasks(&self, user: Option<User>) -> anyhow::Result<Option<User>> {
        let Some(mut user) = user else {
            return Ok(None);
        };
        user.tasks = self.tasks_for(&[user.id]).await?.remove(&user.id).unwrap_or_default();
        Ok(Some(user))
    }

    async fn update_by_id(&self, id: Uuid, u: &UserUpdate) -> Result<Option<User>, RepoError> {
        let sql = format!("UPDATE users SET {UPDATE_SET} WHERE id = $1 RETURNING {USER_COLUMNS}");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(u.name.as_deref())
            .bind(u.email.as_deref())
            .bind(u.role.as_deref())
            .bind(u.status.as_deref())
            .bind(u.picture.as_deref())
            .bind(u.buddy_url.as_deref())
            .bind(u.buddy_name.as_deref())
            .bind(u.department.as_deref())
            .bind(u.position.as_deref())
            .fetch_optional(&self.db)
            .await
            .map_err(unique_violation)?;
        Ok(self.with_tasks(user).await?)
    }
}

fn unique_violation(e: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return RepoError::DuplicateEmail;
        }
    }
    RepoError::Other(anyhow::Error::new(e).context("write user"))
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find user by id")?;
        self.with_tasks(user).await
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .context("find user by email")?;
        self.with_tasks(user).await
    }

    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE name = $1 ORDER BY created_at ASC, id ASC LIMIT 1"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(name)
            .fetch_optional(&self.db)
            .await
            .context("find user by name")?;
        self.with_tasks(user).await
    }

    async fn list_accounts(&self) -> anyhow::Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.db)
            .await
            .context("list users")?;
        Ok(users)
    }

    async fn create(&self, new: NewUser) -> Result<User, RepoError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, email, name, password_hash, role, status, buddy_url,
                               buddy_name, department, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.email)
            .bind(&new.name)
            .bind(&new.password_hash)
            .bind(&new.role)
            .bind(STATUS_ACTIVE)
            .bind(&new.buddy_url)
            .bind(&new.buddy_name)
            .bind(new.department.as_deref())
            .bind(new.position.as_deref())
            .fetch_one(&self.db)
            .await
            .map_err(unique_violation)
    }

    async fn upsert_google(&self, p: &GoogleProfile) -> anyhow::Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, email, name, google_id, picture)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
               SET google_id  = EXCLUDED.google_id,
                   name       = EXCLUDED.name,
                   picture    = EXCLUDED.picture,
                   updated_at = now()
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&p.email)
            .bind(&p.name)
            .bind(&p.google_id)
            .bind(&p.picture)
            .fetch_one(&self.db)
            .await
            .context("upsert google user")?;
        Ok(self
            .with_tasks(Some(user))
            .await?
            .context("upserted user vanished")?)
    }

    async fn update(&self, id: Uuid, update: &UserUpdate) -> Result<Option<User>, RepoError> {
        self.update_by_id(id, update).await
    }

    async fn update_by_name(
        &self,
        name: &str,
        update: &UserUpdate,
    ) -> Result<Option<User>, RepoError> {
        match self.find_by_name(name).await? {
            Some(user) => self.update_by_id(user.id, update).await,
            None => Ok(None),
        }
    }

    async fn push_task(&self, user_id: Uuid, task: NewTask) -> anyhow::Result<Option<User>> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let inserted = sqlx::query(
            r#"
            INSERT INTO tasks (id, user_id, title, datetime, status)
            SELECT $1, id, $3, $4, $5 FROM users WHERE id = $2
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&task.title)
        .bind(task.datetime)
        .bind(TaskStatus::Pending.as_str())
        .execute(&mut *tx)
        .await
        .context("insert task")?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await.context("rollback tx")?;
            return Ok(None);
        }

        sqlx::query("UPDATE users SET updated_at = now() WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("touch user")?;
        tx.commit().await.context("commit tx")?;

        self.find_by_id(user_id).await
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = self.find_by_id(id).await?;
        if user.is_none() {
            return Ok(None);
        }
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(user.filter(|_| deleted.rows_affected() > 0))
    }
}
