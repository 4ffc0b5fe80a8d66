//! User administration service
//!
//! CRUD over accounts for the users endpoint, separate from the
//! authentication flow. Administrative creation may flag the account to
//! force a password change at first login.

use crate::db::repositories::{is_unique_violation, UserRepository};
use crate::models::{User, UserView};
use crate::services::password::hash_password;
use anyhow::Context;
use std::sync::Arc;

/// Error types for user administration
#[derive(Debug, thiserror::Error)]
pub enum UserAdminError {
    #[error("Not found")]
    NotFound,

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for administrative user creation
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Grant the manage_users capability
    #[serde(default)]
    pub admin: bool,
    /// Force a password change at first login
    #[serde(default)]
    pub require_password_change: bool,
}

/// Partial update for a user. Absent fields keep their value.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
    pub url: Option<String>,
}

/// User administration service
pub struct UserAdminService {
    repo: Arc<dyn UserRepository>,
    bcrypt_cost: u32,
}

impl UserAdminService {
    pub fn new(repo: Arc<dyn UserRepository>, bcrypt_cost: u32) -> Self {
        Self { repo, bcrypt_cost }
    }

    /// Create an account. Conflicts on a duplicate username or email.
    pub async fn create(&self, input: CreateUserInput) -> Result<UserView, UserAdminError> {
        if input.username.trim().is_empty() {
            return Err(UserAdminError::ValidationError(
                "Username must not be empty".to_string(),
            ));
        }
        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(UserAdminError::ValidationError(
                "A valid email is required".to_string(),
            ));
        }
        if input.password.is_empty() {
            return Err(UserAdminError::ValidationError(
                "Password must not be empty".to_string(),
            ));
        }

        if self
            .repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserAdminError::UserExists(format!(
                "Username '{}' is already taken",
                input.username
            )));
        }
        if self
            .repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserAdminError::UserExists(format!(
                "Email '{}' is already registered",
                input.email
            )));
        }

        let password_hash =
            hash_password(&input.password, self.bcrypt_cost).context("Failed to hash password")?;

        let display_name = input
            .display_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| input.username.clone());
        let mut user = User::new(input.username, input.email, password_hash, display_name);
        if let Some(url) = input.url {
            user.url = url;
        }
        if input.admin {
            user.status = 1;
        }
        user.require_password_change = input.require_password_change;

        let created = self
            .repo
            .create(&user)
            .await
            .map_err(Self::map_conflict)?;
        Ok(created.view())
    }

    /// Concurrent creates or email changes can both pass the duplicate
    /// checks; the losing write's constraint error is still a conflict.
    fn map_conflict(err: anyhow::Error) -> UserAdminError {
        if is_unique_violation(&err) {
            UserAdminError::UserExists(
                "Username or email is already registered".to_string(),
            )
        } else {
            UserAdminError::InternalError(err.context("Failed to write user"))
        }
    }

    pub async fn get(&self, id: i64) -> Result<UserView, UserAdminError> {
        let user = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or(UserAdminError::NotFound)?;
        Ok(user.view())
    }

    /// List accounts, newest first. Page and limit clamped to at least 1.
    pub async fn list(&self, page: i64, limit: i64) -> Result<(Vec<UserView>, i64), UserAdminError> {
        let page = page.max(1);
        let limit = limit.max(1);
        let (users, total) = self
            .repo
            .list(page, limit)
            .await
            .context("Failed to list users")?;
        Ok((users.iter().map(User::view).collect(), total))
    }

    /// Update an account. A supplied password is re-hashed; a changed email
    /// is checked for conflicts first.
    pub async fn update(&self, id: i64, input: UpdateUserInput) -> Result<UserView, UserAdminError> {
        let mut user = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or(UserAdminError::NotFound)?;

        if let Some(email) = input.email {
            if email != user.email {
                if self
                    .repo
                    .get_by_email(&email)
                    .await
                    .context("Failed to check email")?
                    .is_some()
                {
                    return Err(UserAdminError::UserExists(format!(
                        "Email '{}' is already registered",
                        email
                    )));
                }
                user.email = email;
            }
        }
        if let Some(password) = input.password {
            if password.is_empty() {
                return Err(UserAdminError::ValidationError(
                    "Password must not be empty".to_string(),
                ));
            }
            user.password_hash =
                hash_password(&password, self.bcrypt_cost).context("Failed to hash password")?;
        }
        if let Some(display_name) = input.display_name {
            user.display_name = display_name;
        }
        if let Some(url) = input.url {
            user.url = url;
        }

        let updated = self
            .repo
            .update(&user)
            .await
            .map_err(Self::map_conflict)?;
        Ok(updated.view())
    }

    pub async fn remove(&self, id: i64) -> Result<(), UserAdminError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete user")?;
        if !deleted {
            return Err(UserAdminError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxUserRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::services::password::verify_password;

    async fn setup() -> (UserAdminService, Arc<dyn UserRepository>) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::shared(pool);
        (UserAdminService::new(repo.clone(), 4), repo)
    }

    fn input(username: &str, email: &str) -> CreateUserInput {
        CreateUserInput {
            username: username.to_string(),
            email: email.to_string(),
            password: "initial-password".to_string(),
            display_name: None,
            url: None,
            admin: false,
            require_password_change: false,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (users, _) = setup().await;
        let created = users
            .create(input("alice", "alice@example.com"))
            .await
            .expect("create failed");

        let fetched = users.get(created.id).await.expect("get failed");
        assert_eq!(fetched.username, "alice");
        assert_eq!(fetched.display_name, "alice");
    }

    #[tokio::test]
    async fn test_create_admin_sets_status_and_flag() {
        let (users, repo) = setup().await;
        let mut admin_input = input("root", "root@example.com");
        admin_input.admin = true;
        admin_input.require_password_change = true;

        let created = users.create(admin_input).await.expect("create failed");
        let stored = repo
            .get_by_id(created.id)
            .await
            .expect("query failed")
            .expect("user missing");
        assert_eq!(stored.status, 1);
        assert!(stored.require_password_change);
        assert!(stored.capabilities().contains(&"manage_users".to_string()));
    }

    #[tokio::test]
    async fn test_create_conflicts() {
        let (users, _) = setup().await;
        users
            .create(input("alice", "alice@example.com"))
            .await
            .expect("create failed");

        assert!(matches!(
            users.create(input("alice", "other@example.com")).await,
            Err(UserAdminError::UserExists(_))
        ));
        assert!(matches!(
            users.create(input("bob", "alice@example.com")).await,
            Err(UserAdminError::UserExists(_))
        ));
    }

    #[tokio::test]
    async fn test_lost_write_race_maps_to_conflict() {
        // A concurrent create that passed the duplicate checks loses to
        // the unique index; its error is a conflict, not an internal one.
        let (users, repo) = setup().await;
        users
            .create(input("alice", "alice@example.com"))
            .await
            .expect("create failed");

        let dup = User::new(
            "alice".to_string(),
            "other@example.com".to_string(),
            "hash".to_string(),
            "Alice".to_string(),
        );
        let err = repo.create(&dup).await.expect_err("insert should fail");
        assert!(matches!(
            UserAdminService::map_conflict(err),
            UserAdminError::UserExists(_)
        ));
    }

    #[tokio::test]
    async fn test_update_rehashes_password() {
        let (users, repo) = setup().await;
        let created = users
            .create(input("alice", "alice@example.com"))
            .await
            .expect("create failed");

        users
            .update(
                created.id,
                UpdateUserInput {
                    password: Some("rotated".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("update failed");

        let stored = repo
            .get_by_id(created.id)
            .await
            .expect("query failed")
            .expect("user missing");
        assert!(verify_password("rotated", &stored.password_hash).expect("verify failed"));
        assert!(!verify_password("initial-password", &stored.password_hash).expect("verify failed"));
    }

    #[tokio::test]
    async fn test_update_email_conflict() {
        let (users, _) = setup().await;
        users
            .create(input("alice", "alice@example.com"))
            .await
            .expect("create failed");
        let bob = users
            .create(input("bob", "bob@example.com"))
            .await
            .expect("create failed");

        let result = users
            .update(
                bob.id,
                UpdateUserInput {
                    email: Some("alice@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(UserAdminError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_remove() {
        let (users, _) = setup().await;
        let created = users
            .create(input("alice", "alice@example.com"))
            .await
            .expect("create failed");

        users.remove(created.id).await.expect("remove failed");
        assert!(matches!(
            users.remove(created.id).await,
            Err(UserAdminError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (users, _) = setup().await;
        for i in 0..3 {
            users
                .create(input(&format!("user{}", i), &format!("u{}@example.com", i)))
                .await
                .expect("create failed");
        }

        let (views, total) = users.list(1, 2).await.expect("list failed");
        assert_eq!(total, 3);
        assert_eq!(views.len(), 2);
    }
}
