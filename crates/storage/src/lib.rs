use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};

use shared::domain::{CollectionPatch, TodoCollection, TodoId, TodoItem, UserId};
use todo_core::FlagStore;

/// Sqlite-backed user directory and flag store. One row per
/// `(user_id, todo_id)` pair, so sparse merges and key removal map directly
/// onto upserts and deletes.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Registers a user under a fresh opaque id. Re-registering an existing
    /// username returns the id already on record.
    pub async fn create_user(&self, username: &str) -> Result<UserId> {
        let user_id = UserId::generate();
        let rec = sqlx::query(
            "INSERT INTO users (id, username) VALUES (?, ?)
             ON CONFLICT(username) DO UPDATE SET username=excluded.username
             RETURNING id",
        )
        .bind(user_id.as_str())
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(UserId(rec.get::<String, _>(0)))
    }

    pub async fn user_id_for_username(&self, username: &str) -> Result<Option<UserId>> {
        let row = sqlx::query("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| UserId(r.get::<String, _>(0))))
    }

    pub async fn username_for_user(&self, user_id: &UserId) -> Result<Option<String>> {
        let row = sqlx::query("SELECT username FROM users WHERE id = ?")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>(0)))
    }

    async fn user_exists(&self, user_id: &UserId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE id = ?")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl FlagStore for Storage {
    async fn read(&self, user_id: &UserId) -> Result<Option<TodoCollection>> {
        if !self.user_exists(user_id).await? {
            return Ok(None);
        }

        let rows = sqlx::query("SELECT todo_id, label, is_done FROM todo_flags WHERE user_id = ?")
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await?;

        let mut collection = TodoCollection::new();
        for row in rows {
            let id = TodoId(row.get::<String, _>(0));
            collection.insert(
                id.clone(),
                TodoItem {
                    id,
                    label: row.get::<String, _>(1),
                    is_done: row.get::<bool, _>(2),
                    user_id: user_id.clone(),
                },
            );
        }
        Ok(Some(collection))
    }

    async fn merge_write(&self, user_id: &UserId, patch: &CollectionPatch) -> Result<()> {
        if !self.user_exists(user_id).await? {
            bail!("unknown user '{user_id}'");
        }

        // COALESCE keeps stored values for fields the patch leaves out.
        let mut tx = self.pool.begin().await?;
        for (todo_id, fields) in patch {
            sqlx::query(
                "INSERT INTO todo_flags (user_id, todo_id, label, is_done)
                 VALUES (?1, ?2, COALESCE(?3, ''), COALESCE(?4, 0))
                 ON CONFLICT(user_id, todo_id) DO UPDATE SET
                    label = COALESCE(?3, todo_flags.label),
                    is_done = COALESCE(?4, todo_flags.is_done),
                    updated_at = CURRENT_TIMESTAMP",
            )
            .bind(user_id.as_str())
            .bind(todo_id.as_str())
            .bind(fields.label.as_deref())
            .bind(fields.is_done)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to merge todo flag '{todo_id}'"))?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn remove(&self, user_id: &UserId, todo_id: &TodoId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM todo_flags WHERE user_id = ? AND todo_id = ?")
            .bind(user_id.as_str())
            .bind(todo_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn user_ids(&self) -> Result<Vec<UserId>> {
        let rows = sqlx::query("SELECT id FROM users ORDER BY rowid ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| UserId(r.get::<String, _>(0)))
            .collect())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
