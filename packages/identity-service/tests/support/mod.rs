//! In-memory user repository double for register/login/refresh tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use identity_core::domains::user::{RefreshToken, RepositoryError, User, UserRepository};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<Uuid, User>>,
    refresh_tokens: Mutex<HashMap<Uuid, RefreshToken>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> Result<(), RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<User, RepositoryError> {
        self.users
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn store_refresh_token(&self, token: &RefreshToken) -> Result<(), RepositoryError> {
        self.refresh_tokens
            .lock()
            .unwrap()
            .insert(token.user_id, token.clone());
        Ok(())
    }

    async fn get_refresh_token(&self, token: &str) -> Result<RefreshToken, RepositoryError> {
        self.refresh_tokens
            .lock()
            .unwrap()
            .values()
            .find(|t| t.token == token)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }
}
