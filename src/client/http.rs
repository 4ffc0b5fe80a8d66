//! Admin API client
//!
//! A thin typed wrapper over reqwest that attaches the session's bearer
//! token to every request. Any 401 response, from any endpoint, clears the
//! session store and surfaces [`ClientError::SessionExpired`]; there are no
//! retries and no exceptions to the rule.

use crate::client::session::{Session, SessionStore};
use crate::services::auth::AuthOutcome;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Error type for client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered 401; the local session has been cleared.
    #[error("Session expired")]
    SessionExpired,

    /// Non-401 error response, decoded from the JSON error envelope.
    #[error("API error ({status}) {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Connection or protocol failure.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, serde::Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// HTTP client bound to one API base URL and one session store.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Arc<SessionStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Register an account and install the returned session.
    pub async fn register<B: Serialize>(&self, body: &B) -> Result<Session, ClientError> {
        let outcome: AuthOutcome = self.request(Method::POST, "/api/auth/register", Some(body)).await?;
        self.install(outcome)
    }

    /// Log in and install the returned session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        let body = serde_json::json!({"username": username, "password": password});
        let outcome: AuthOutcome = self.request(Method::POST, "/api/auth/login", Some(&body)).await?;
        self.install(outcome)
    }

    /// Change the password and install the rotated session.
    pub async fn change_password(&self, new_password: &str) -> Result<Session, ClientError> {
        let body = serde_json::json!({"newPassword": new_password});
        let outcome: AuthOutcome = self
            .request(Method::POST, "/api/auth/change-password", Some(&body))
            .await?;
        self.install(outcome)
    }

    /// Drop the local session.
    pub fn logout(&self) {
        self.session.clear();
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(Method::GET, path, None::<&()>).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let response = self.send(Method::DELETE, path, None::<&()>).await?;
        self.check(response).await?;
        Ok(())
    }

    fn install(&self, outcome: AuthOutcome) -> Result<Session, ClientError> {
        self.session
            .set_session(&outcome.token, outcome.user)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    async fn request<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        let response = self.send(method, path, body).await?;
        let response = self.check(response).await?;
        response.json::<T>().await.map_err(ClientError::from)
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ClientError> {
        let mut builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(session) = self.session.current() {
            builder = builder.bearer_auth(&session.token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }

    /// Enforce the 401 contract and decode non-success envelopes.
    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        if response.status() == StatusCode::UNAUTHORIZED {
            self.session.clear();
            return Err(ClientError::SessionExpired);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let envelope = response.json::<ErrorEnvelope>().await.map_err(|e| {
                ClientError::InvalidResponse(format!("undecodable error body: {}", e))
            })?;
            return Err(ClientError::Api {
                status,
                code: envelope.error.code,
                message: envelope.error.message,
            });
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support;
    use crate::client::session::MemoryTokenStorage;
    use crate::models::Content;
    use crate::services::token::TokenService;

    /// Serve the real API on an ephemeral port, returning its base URL.
    async fn spawn_server() -> String {
        let state = test_support::test_state().await;
        let app = crate::api::build_router(state, "http://localhost:4200")
            .expect("Failed to build router");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server failed");
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str) -> ApiClient {
        ApiClient::new(
            base_url,
            Arc::new(SessionStore::new(Arc::new(MemoryTokenStorage::new()))),
        )
    }

    #[tokio::test]
    async fn test_register_installs_session() {
        let base = spawn_server().await;
        let client = client(&base);

        let session = client
            .register(&serde_json::json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "hunter2!",
            }))
            .await
            .expect("register failed");

        assert_eq!(session.user.username, "alice");
        assert!(session.has_capability("manage_content"));
        assert!(client.session().current().is_some());
    }

    #[tokio::test]
    async fn test_login_failure_reports_session_expired_without_session() {
        let base = spawn_server().await;
        let client = client(&base);

        let result = client.login("nobody", "wrong").await;
        assert!(matches!(result, Err(ClientError::SessionExpired)));
        assert!(client.session().current().is_none());
    }

    #[tokio::test]
    async fn test_bearer_attached_to_requests() {
        let base = spawn_server().await;
        let client = client(&base);
        client
            .register(&serde_json::json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "hunter2!",
            }))
            .await
            .expect("register failed");

        let created: Content = client
            .post("/api/posts", &serde_json::json!({"title": "From the client"}))
            .await
            .expect("create failed");
        assert_eq!(created.title, "From the client");
    }

    #[tokio::test]
    async fn test_401_clears_session_exactly_once() {
        let base = spawn_server().await;
        let client = client(&base);

        // A token signed with the wrong secret decodes fine on the client
        // but the server rejects it
        let forged = TokenService::new("not-the-server-secret", 1)
            .issue(1, "alice", "alice@example.com", false, vec![])
            .expect("Failed to issue token");
        let view = crate::models::UserView {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            display_name: "Alice".to_string(),
        };
        client
            .session()
            .set_session(&forged, view)
            .expect("set failed");

        let mut rx = client.session().subscribe();
        rx.borrow_and_update();

        let result = client
            .post::<_, Content>("/api/posts", &serde_json::json!({"title": "x"}))
            .await;
        assert!(matches!(result, Err(ClientError::SessionExpired)));

        // Observable went empty, storage cleared, and it happened once
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
        assert!(client.session().current().is_none());
        assert!(!client.session().clear());
    }

    #[tokio::test]
    async fn test_conflict_surfaces_api_error() {
        let base = spawn_server().await;
        let client = client(&base);
        let payload = serde_json::json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "hunter2!",
        });
        client.register(&payload).await.expect("register failed");

        let result = client.register(&payload).await;
        match result {
            Err(ClientError::Api { status, code, .. }) => {
                assert_eq!(status, 409);
                assert_eq!(code, "CONFLICT");
            }
            other => panic!("expected conflict, got {:?}", other.map(|s| s.user)),
        }
    }
}
