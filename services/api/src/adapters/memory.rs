//! services/api/src/adapters/memory.rs
//!
//! A process-local `UserStore`, used when no `DATABASE_URL` is configured and
//! by the integration tests. Records vanish with the process.

use std::collections::HashMap;

use agrivision_core::domain::{NewUser, User, UserCredentials};
use agrivision_core::ports::{PortError, PortResult, UserStore};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryUserStore {
    /// Keyed by email, which keeps uniqueness a map-level property.
    users: RwLock<HashMap<String, UserCredentials>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&new_user.email) {
            return Err(PortError::AlreadyExists("User already exists".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email.clone(),
            created_at: Utc::now(),
        };
        users.insert(
            new_user.email,
            UserCredentials {
                user: user.clone(),
                password_hash: new_user.password_hash,
            },
        );
        Ok(user)
    }

    async fn find_credentials_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.users
            .read()
            .await
            .values()
            .find(|c| c.user.id == user_id)
            .map(|c| c.user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }
}
