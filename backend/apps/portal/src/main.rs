//! Portal Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; application-level errors flow
//! through `kernel::error::AppError`.

use auth::{AuthConfig, PgAuthRepository};
use axum::{
    Json, Router, http,
    http::{Method, header},
    routing::get,
};
use base64::Engine;
use base64::engine::general_purpose;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wg::{PgWgRepository, WgConfig};

use auth::domain::repository::SessionRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal=info,auth=info,wg=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: drop sessions whose absolute expiry is long past.
    // Errors here should not prevent server startup.
    let session_store = PgAuthRepository::new(pool.clone());
    match session_store
        .purge_expired_before(Utc::now() - chrono::Duration::days(30))
        .await
    {
        Ok(deleted) => {
            tracing::info!(sessions_deleted = deleted, "Session sweep completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Session sweep failed, continuing anyway");
        }
    }

    let auth_config = load_auth_config()?;
    let wg_config = load_wg_config();

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40080,http://127.0.0.1:40080".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Peer administration sits behind session enforcement; the auth
    // routes manage their own protection internally.
    let peers = auth::with_session_guard(
        wg::wg_router(PgWgRepository::new(pool.clone()), wg_config),
        PgAuthRepository::new(pool.clone()),
        auth_config.clone(),
    );

    let start = Instant::now();

    // Build router
    let app = Router::new()
        .nest(
            "/api/auth",
            auth::auth_router(PgAuthRepository::new(pool.clone()), auth_config),
        )
        .nest("/api/peers", peers)
        .route(
            "/healthz",
            get(move || async move {
                Json(serde_json::json!({
                    "status": "ok",
                    "uptime_seconds": start.elapsed().as_secs(),
                }))
            }),
        )
        .route(
            "/readyz",
            get(|| async { Json(serde_json::json!({ "status": "ready" })) }),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 31180));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Auth configuration from the environment.
///
/// Outside debug builds the ticket secret must be provided; in
/// development a random one is generated per process.
fn load_auth_config() -> anyhow::Result<AuthConfig> {
    let mut config = if cfg!(debug_assertions) {
        AuthConfig::development()
    } else {
        let secret_b64 = env::var("TICKET_SECRET")
            .expect("TICKET_SECRET must be set in production (base64, 32 bytes)");
        let secret_bytes = Engine::decode(&general_purpose::STANDARD, &secret_b64)?;
        anyhow::ensure!(
            secret_bytes.len() == 32,
            "TICKET_SECRET must decode to exactly 32 bytes"
        );
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&secret_bytes);
        AuthConfig {
            ticket_secret: secret,
            ..AuthConfig::default()
        }
    };

    if let Ok(pepper) = env::var("PASSWORD_PEPPER") {
        if !pepper.is_empty() {
            config.password_pepper = Some(pepper.into_bytes());
        }
    }
    if let Ok(issuer) = env::var("TOTP_ISSUER") {
        if !issuer.is_empty() {
            config.totp_issuer = issuer;
        }
    }
    if let Ok(same_site) = env::var("COOKIE_SAMESITE") {
        config.cookie_same_site = auth::config::SameSite::parse(&same_site);
    }
    if let Ok(idle) = env::var("SESSION_IDLE_SECONDS") {
        config.session_idle_timeout = Duration::from_secs(idle.parse()?);
    }
    if let Ok(absolute) = env::var("SESSION_ABSOLUTE_SECONDS") {
        config.session_absolute_timeout = Duration::from_secs(absolute.parse()?);
    }

    Ok(config)
}

/// WireGuard control configuration from the environment.
fn load_wg_config() -> WgConfig {
    let mut config = if cfg!(debug_assertions) {
        WgConfig::development()
    } else {
        WgConfig::default()
    };

    if let Ok(bin) = env::var("WG_BIN") {
        if !bin.is_empty() {
            config.wg_bin = bin;
        }
    }
    if let Ok(iface) = env::var("WG_INTERFACE") {
        if !iface.is_empty() {
            config.interface = iface;
        }
    }
    if let Ok(timeout) = env::var("WG_COMMAND_TIMEOUT_SECONDS") {
        if let Ok(secs) = timeout.parse() {
            config.command_timeout = Duration::from_secs(secs);
        }
    }

    config
}
