use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::AuthError;
use crate::auth::repo_types::{NewUser, User};

/// SQLSTATE raised by Postgres on a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Persisted user records keyed by username.
///
/// Registration checks `find_by_username` before `insert`, and two concurrent
/// registrations may both pass that check. `insert` must therefore enforce
/// username uniqueness itself and report a clash as
/// [`AuthError::DuplicateAccount`].
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError>;
    async fn insert(&self, user: NewUser) -> Result<User, AuthError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, username, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, username, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, AuthError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, first_name, last_name, username, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, first_name, last_name, username, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await;

        match created {
            Ok(u) => Ok(u),
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                Err(AuthError::DuplicateAccount)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store; the map lock makes check-and-insert atomic.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, User>>, AuthError> {
        self.users
            .lock()
            .map_err(|_| AuthError::Storage(anyhow::anyhow!("user map poisoned")))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        Ok(self.lock()?.get(username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        Ok(self.lock()?.values().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, AuthError> {
        let mut users = self.lock()?;
        if users.contains_key(&user.username) {
            return Err(AuthError::DuplicateAccount);
        }
        let created = User {
            id: Uuid::new_v4(),
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            password_hash: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(created.username.clone(), created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            first_name: "Ada".into(),
            last_name: "L".into(),
            username: username.into(),
            password_hash: "$argon2id$placeholder".into(),
        }
    }

    #[tokio::test]
    async fn memory_store_insert_and_find() {
        let store = MemoryUserStore::new();
        let created = store.insert(new_user("ada")).await.unwrap();

        let by_name = store.find_by_username("ada").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "ada");
    }

    #[tokio::test]
    async fn memory_store_username_is_case_sensitive() {
        let store = MemoryUserStore::new();
        store.insert(new_user("ada")).await.unwrap();
        assert!(store.find_by_username("Ada").await.unwrap().is_none());
        assert!(store.insert(new_user("Ada")).await.is_ok());
    }

    #[tokio::test]
    async fn memory_store_rejects_duplicate_insert() {
        let store = MemoryUserStore::new();
        store.insert(new_user("ada")).await.unwrap();
        let err = store.insert(new_user("ada")).await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateAccount));
    }
}
