//! User directory collaborator.
//!
//! Login handlers look accounts up through [`UserDirectory`]. The stored role
//! name is kept exactly as the backing store has it (possibly a legacy
//! spelling); it is normalized into a [`crate::roles::Role`] only when an
//! identity is issued.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::types::DbId;

#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: DbId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Option<UserRecord>;
}

/// Directory held in process memory; seeded at startup and by tests.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account. Usernames are unique, compared case-insensitively.
    pub async fn insert(
        &self,
        username: &str,
        password_hash: String,
        role: &str,
    ) -> Result<UserRecord, CoreError> {
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(username))
        {
            return Err(CoreError::Conflict(format!(
                "Username '{username}' is already taken"
            )));
        }

        let record = UserRecord {
            id: users.len() as DbId + 1,
            username: username.to_string(),
            password_hash,
            role: role.to_string(),
            is_active: true,
        };
        users.push(record.clone());
        Ok(record)
    }

    pub async fn deactivate(&self, id: DbId) -> Result<(), CoreError> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(CoreError::NotFound { entity: "User", id })?;
        user.is_active = false;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned()
    }
}
