use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use talentdesk_api::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use talentdesk_api::config::{LogFormat, ServerConfig};
use talentdesk_api::router::build_app_router;
use talentdesk_api::state::AppState;
use talentdesk_core::roles::Role;
use talentdesk_db::models::user::CreateUser;
use talentdesk_db::repositories::UserRepo;
use talentdesk_db::DbPool;
use talentdesk_outreach::{DisabledGateway, HttpOutreachGateway, OutreachConfig, OutreachGateway};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let (pretty, json) = match config.log_format {
        LogFormat::Pretty => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "talentdesk_api=debug,tower_http=debug".into()),
        )
        .with(pretty)
        .with(json)
        .init();

    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");
    if config.auth_disabled {
        tracing::warn!("AUTH_DISABLED is set: every request runs as the built-in operator");
    }

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = talentdesk_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    talentdesk_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    talentdesk_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    if let Err(e) = bootstrap_admin(&pool).await {
        tracing::error!(error = %e, "Bootstrap admin was not created");
    }

    // --- Outreach ---
    let outreach: Arc<dyn OutreachGateway> = match OutreachConfig::from_env() {
        Some(outreach_config) => {
            tracing::info!(url = %outreach_config.api_url, "Outreach service configured");
            Arc::new(
                HttpOutreachGateway::new(outreach_config)
                    .expect("Failed to build outreach HTTP client"),
            )
        }
        None => {
            tracing::warn!("OUTREACH_API_URL not set: messages are recorded but not delivered");
            Arc::new(DisabledGateway)
        }
    };

    // --- App state and router ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        outreach,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Create the first admin from `ADMIN_USERNAME`, `ADMIN_EMAIL` and
/// `ADMIN_PASSWORD` when all three are set and the username is free.
async fn bootstrap_admin(pool: &DbPool) -> Result<(), String> {
    let (Ok(username), Ok(email), Ok(password)) = (
        std::env::var("ADMIN_USERNAME"),
        std::env::var("ADMIN_EMAIL"),
        std::env::var("ADMIN_PASSWORD"),
    ) else {
        return Ok(());
    };

    let existing = UserRepo::find_by_username(pool, &username)
        .await
        .map_err(|e| e.to_string())?;
    if existing.is_some() {
        return Ok(());
    }

    validate_password_strength(&password, MIN_PASSWORD_LENGTH)?;
    let password_hash = hash_password(&password).map_err(|e| e.to_string())?;
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username,
            email,
            password_hash,
            role: Role::Admin.to_string(),
        },
    )
    .await
    .map_err(|e| e.to_string())?;

    tracing::info!(user_id = user.id, username = %user.username, "Bootstrap admin created");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
