//! Authentication service
//!
//! Registration, login, token-backed user validation and password change.
//! Login failures for an unknown username and for a wrong password produce
//! the exact same error so the endpoint cannot be used to enumerate
//! accounts.

use crate::db::repositories::{is_unique_violation, UserRepository};
use crate::models::{User, UserView};
use crate::services::password::{hash_password, verify_password};
use crate::services::token::{Claims, TokenService};
use anyhow::Context;
use std::sync::Arc;

/// Error types for authentication operations
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    /// Username or email already registered
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Invalid credentials or unknown account. One message for every
    /// authentication failure.
    #[error("Invalid credentials")]
    Unauthorized,

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Registration input
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A successful authentication: the signed token plus the public user view.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AuthOutcome {
    pub token: String,
    pub user: UserView,
}

/// Authentication service
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    tokens: TokenService,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(user_repo: Arc<dyn UserRepository>, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self {
            user_repo,
            tokens,
            bcrypt_cost,
        }
    }

    /// Register a new account.
    ///
    /// Fails with `UserExists` when the username or the email is already
    /// stored (exact, case-sensitive comparison against stored values).
    pub async fn register(&self, input: RegisterInput) -> Result<AuthOutcome, AuthServiceError> {
        self.validate_register_input(&input)?;

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(AuthServiceError::UserExists(format!(
                "Username '{}' is already taken",
                input.username
            )));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(AuthServiceError::UserExists(format!(
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
        let user = User::new(input.username, input.email, password_hash, display_name);

        let created = self
            .user_repo
            .create(&user)
            .await
            .map_err(Self::map_create_error)?;

        let token = self.issue_for(&created)?;
        Ok(AuthOutcome {
            token,
            user: created.view(),
        })
    }

    /// Authenticate with username and password.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthOutcome, AuthServiceError> {
        let user = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to look up user")?
            .ok_or(AuthServiceError::Unauthorized)?;

        let matches = verify_password(password, &user.password_hash)
            .context("Failed to verify password")?;
        if !matches {
            return Err(AuthServiceError::Unauthorized);
        }

        let token = self.issue_for(&user)?;
        Ok(AuthOutcome {
            token,
            user: user.view(),
        })
    }

    /// Confirm that the user behind a verified token still exists.
    ///
    /// Called by the bearer guard after signature and expiry checks.
    pub async fn validate_user(&self, id: i64) -> Result<UserView, AuthServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to look up user")?
            .ok_or(AuthServiceError::Unauthorized)?;
        Ok(user.view())
    }

    /// Replace the user's password, clear the forced-change flag and issue
    /// a fresh token reflecting the cleared flag.
    pub async fn change_password(
        &self,
        id: i64,
        new_password: &str,
    ) -> Result<AuthOutcome, AuthServiceError> {
        if new_password.is_empty() {
            return Err(AuthServiceError::ValidationError(
                "Password must not be empty".to_string(),
            ));
        }

        let mut user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to look up user")?
            .ok_or(AuthServiceError::Unauthorized)?;

        user.password_hash =
            hash_password(new_password, self.bcrypt_cost).context("Failed to hash password")?;
        user.require_password_change = false;

        let updated = self
            .user_repo
            .update(&user)
            .await
            .context("Failed to update user")?;

        let token = self.issue_for(&updated)?;
        Ok(AuthOutcome {
            token,
            user: updated.view(),
        })
    }

    /// Verify a bearer token's signature and expiry.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthServiceError> {
        self.tokens
            .verify(token)
            .map_err(|_| AuthServiceError::Unauthorized)
    }

    fn issue_for(&self, user: &User) -> Result<String, AuthServiceError> {
        let token = self
            .tokens
            .issue(
                user.id,
                &user.username,
                &user.email,
                user.require_password_change,
                user.capabilities(),
            )
            .context("Failed to issue token")?;
        Ok(token)
    }

    /// Concurrent registrations can both pass the duplicate checks; the
    /// losing insert's constraint error is still a conflict.
    fn map_create_error(err: anyhow::Error) -> AuthServiceError {
        if is_unique_violation(&err) {
            AuthServiceError::UserExists(
                "Username or email is already registered".to_string(),
            )
        } else {
            AuthServiceError::InternalError(err.context("Failed to create user"))
        }
    }

    fn validate_register_input(&self, input: &RegisterInput) -> Result<(), AuthServiceError> {
        if input.username.trim().is_empty() {
            return Err(AuthServiceError::ValidationError(
                "Username must not be empty".to_string(),
            ));
        }
        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(AuthServiceError::ValidationError(
                "A valid email is required".to_string(),
            ));
        }
        if input.password.is_empty() {
            return Err(AuthServiceError::ValidationError(
                "Password must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxUserRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_with_repo() -> (AuthService, Arc<dyn UserRepository>) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::shared(pool);
        (
            AuthService::new(repo.clone(), TokenService::new("test-secret", 1), 4),
            repo,
        )
    }

    async fn setup() -> AuthService {
        setup_with_repo().await.0
    }

    fn input(username: &str, email: &str) -> RegisterInput {
        RegisterInput {
            username: username.to_string(),
            email: email.to_string(),
            password: "hunter2!".to_string(),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn test_register_returns_token_and_view() {
        let auth = setup().await;
        let outcome = auth
            .register(input("alice", "alice@example.com"))
            .await
            .expect("register failed");

        assert_eq!(outcome.user.username, "alice");
        assert_eq!(outcome.user.display_name, "alice");

        let claims = auth.verify_token(&outcome.token).expect("token invalid");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@example.com");
        assert!(!claims.require_password_change);
        assert!(claims.has_capability("manage_content"));
    }

    #[tokio::test]
    async fn test_register_duplicate_username_conflicts() {
        let auth = setup().await;
        auth.register(input("alice", "alice@example.com"))
            .await
            .expect("register failed");

        let result = auth.register(input("alice", "other@example.com")).await;
        assert!(matches!(result, Err(AuthServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let auth = setup().await;
        auth.register(input("alice", "alice@example.com"))
            .await
            .expect("register failed");

        let result = auth.register(input("bob", "alice@example.com")).await;
        assert!(matches!(result, Err(AuthServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_lost_insert_race_maps_to_conflict() {
        // Both sides of a concurrent registration pass the duplicate
        // checks; the loser hits the unique index on insert.
        let (auth, repo) = setup_with_repo().await;
        auth.register(input("alice", "alice@example.com"))
            .await
            .expect("register failed");

        let dup = User::new(
            "alice".to_string(),
            "other@example.com".to_string(),
            "hash".to_string(),
            "Alice".to_string(),
        );
        let err = repo.create(&dup).await.expect_err("insert should fail");
        assert!(matches!(
            AuthService::map_create_error(err),
            AuthServiceError::UserExists(_)
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input() {
        let auth = setup().await;
        assert!(matches!(
            auth.register(input("", "alice@example.com")).await,
            Err(AuthServiceError::ValidationError(_))
        ));
        assert!(matches!(
            auth.register(input("alice", "not-an-email")).await,
            Err(AuthServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_login_roundtrip() {
        let auth = setup().await;
        auth.register(input("alice", "alice@example.com"))
            .await
            .expect("register failed");

        let outcome = auth.login("alice", "hunter2!").await.expect("login failed");
        let claims = auth.verify_token(&outcome.token).expect("token invalid");
        assert_eq!(claims.sub, outcome.user.id);
        assert_eq!(claims.username, "alice");
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let auth = setup().await;
        auth.register(input("alice", "alice@example.com"))
            .await
            .expect("register failed");

        let unknown = auth.login("nobody", "hunter2!").await.unwrap_err();
        let wrong = auth.login("alice", "wrong-password").await.unwrap_err();

        assert!(matches!(unknown, AuthServiceError::Unauthorized));
        assert!(matches!(wrong, AuthServiceError::Unauthorized));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_validate_user() {
        let auth = setup().await;
        let outcome = auth
            .register(input("alice", "alice@example.com"))
            .await
            .expect("register failed");

        let view = auth
            .validate_user(outcome.user.id)
            .await
            .expect("validate failed");
        assert_eq!(view.username, "alice");

        assert!(matches!(
            auth.validate_user(9999).await,
            Err(AuthServiceError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_change_password_clears_flag_and_rotates_token() {
        let (auth, repo) = setup_with_repo().await;
        let outcome = auth
            .register(input("alice", "alice@example.com"))
            .await
            .expect("register failed");

        // Force the flag on, as an admin-created account would have it
        let mut user = repo
            .get_by_id(outcome.user.id)
            .await
            .expect("query failed")
            .expect("user missing");
        user.require_password_change = true;
        repo.update(&user).await.expect("update failed");

        let changed = auth
            .change_password(outcome.user.id, "new-password")
            .await
            .expect("change failed");

        let claims = auth.verify_token(&changed.token).expect("token invalid");
        assert!(!claims.require_password_change);

        let stored = repo
            .get_by_id(outcome.user.id)
            .await
            .expect("query failed")
            .expect("user missing");
        assert!(!stored.require_password_change);

        // Old password no longer works, new one does
        assert!(matches!(
            auth.login("alice", "hunter2!").await,
            Err(AuthServiceError::Unauthorized)
        ));
        auth.login("alice", "new-password")
            .await
            .expect("login with new password failed");
    }
}
