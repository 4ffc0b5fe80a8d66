//! IronPress - a headless content management backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ironpress::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{SqlxContentRepository, SqlxTermRepository, SqlxUserRepository},
    },
    models::{ContentType, Taxonomy},
    services::{
        AuthService, ContentService, CreateUserInput, TermService, TokenService, UserAdminService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ironpress=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting IronPress...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let user_repo = SqlxUserRepository::shared(pool.clone());
    let content_repo = SqlxContentRepository::shared(pool.clone());
    let term_repo = SqlxTermRepository::shared(pool.clone());

    // Initialize services
    let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.token_ttl_hours);
    let auth_service = Arc::new(AuthService::new(
        user_repo.clone(),
        tokens,
        config.auth.bcrypt_cost,
    ));
    let user_service = Arc::new(UserAdminService::new(
        user_repo.clone(),
        config.auth.bcrypt_cost,
    ));
    let post_service = Arc::new(ContentService::new(content_repo.clone(), ContentType::Post));
    let page_service = Arc::new(ContentService::new(content_repo.clone(), ContentType::Page));
    let media_service = Arc::new(ContentService::new(content_repo, ContentType::Attachment));
    let category_service = Arc::new(TermService::new(term_repo.clone(), Taxonomy::Category));
    let tag_service = Arc::new(TermService::new(term_repo, Taxonomy::PostTag));

    // Seed the first administrator on an empty install
    if user_repo.count().await? == 0 {
        if let Ok(seed) = std::env::var("IRONPRESS_BOOTSTRAP_ADMIN") {
            bootstrap_admin(&user_service, &seed).await?;
        }
    }

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        auth_service,
        post_service,
        page_service,
        media_service,
        user_service,
        category_service,
        tag_service,
        upload_config: Arc::new(config.upload.clone()),
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin)?;

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the initial administrator from a "username:email:password" triple.
async fn bootstrap_admin(users: &UserAdminService, seed: &str) -> Result<()> {
    let mut parts = seed.splitn(3, ':');
    let (username, email, password) = match (parts.next(), parts.next(), parts.next()) {
        (Some(u), Some(e), Some(p)) if !u.is_empty() && !e.is_empty() && !p.is_empty() => {
            (u, e, p)
        }
        _ => anyhow::bail!("IRONPRESS_BOOTSTRAP_ADMIN must be username:email:password"),
    };

    let view = users
        .create(CreateUserInput {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            display_name: None,
            url: None,
            admin: true,
            require_password_change: false,
        })
        .await
        .map_err(|e| anyhow::anyhow!("bootstrap admin creation failed: {e}"))?;
    tracing::info!("Bootstrap administrator created: {}", view.username);

    Ok(())
}
