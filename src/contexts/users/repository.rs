//! User storage.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub status: UserStatus,
}

/// Storage port for users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: User);
    /// Replace the stored user with the same id. Returns false if absent.
    async fn update(&self, user: User) -> bool;
    async fn find_by_id(&self, id: &str) -> Option<User>;
    async fn find_by_email(&self, email: &str) -> Option<User>;
    async fn list(&self) -> Vec<User>;
}

/// Users kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: User) {
        self.users.write().await.push(user);
    }

    async fn update(&self, user: User) -> bool {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|stored| stored.id == user.id) {
            Some(stored) => {
                *stored = user;
                true
            }
            None => false,
        }
    }

    async fn find_by_id(&self, id: &str) -> Option<User> {
        self.users.read().await.iter().find(|user| user.id == id).cloned()
    }

    async fn find_by_email(&self, email: &str) -> Option<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    async fn list(&self) -> Vec<User> {
        self.users.read().await.clone()
    }
}
