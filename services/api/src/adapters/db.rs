//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `UserStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use agrivision_core::domain::{NewUser, User, UserCredentials};
use agrivision_core::ports::{PortError, PortResult, UserStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// The SQLSTATE Postgres reports for a unique index violation.
const UNIQUE_VIOLATION: &str = "23505";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `UserStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl UserRecord {
    fn to_credentials(self) -> UserCredentials {
        UserCredentials {
            user: User {
                id: self.id,
                name: self.name,
                email: self.email,
                created_at: self.created_at,
            },
            password_hash: self.password_hash,
        }
    }
}

fn map_sqlx_error(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            PortError::AlreadyExists("User already exists".to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for DbAdapter {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, email, password_hash, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(record.to_credentials().user)
    }

    async fn find_credentials_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(record.map(UserRecord::to_credentials))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => map_sqlx_error(e),
        })?;

        Ok(record.to_credentials().user)
    }
}
