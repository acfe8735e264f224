//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use std::env;
use std::net::SocketAddr;

use access::application::AttemptTracker;
use access::domain::entity::User;
use access::domain::repository::{AccessRepository, UserRepository};
use access::{
    AccessAppState, AccessConfig, MemoryAccessRepository, PgAccessRepository, Role,
    STEP_UP_HEADER, access_router,
};
use axum::{
    Router, http,
    http::{HeaderName, Method, header},
};
use platform::password::ClearTextPassword;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

const ENV_BOOTSTRAP_ADMIN_USER: &str = "ACCESS_BOOTSTRAP_ADMIN_USER";
const ENV_BOOTSTRAP_ADMIN_PASSWORD: &str = "ACCESS_BOOTSTRAP_ADMIN_PASSWORD";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,access=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Debug builds may run with a throwaway token secret
    let config = AccessConfig::from_env(cfg!(debug_assertions))?;
    let bootstrap = bootstrap_admin(&config)?;

    let auth = match env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;

            tracing::info!("Connected to database");

            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            let repo = PgAccessRepository::new(pool);
            if let Some(user) = bootstrap {
                if repo.find_by_user_name(&user.user_name).await?.is_none() {
                    repo.upsert_user(&user).await?;
                    tracing::info!(user_name = %user.user_name, "Bootstrap admin created");
                }
            }
            build_state(repo, config).await
        }
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set, using in-memory storage; lockouts and audit entries are lost on restart"
            );
            let repo = MemoryAccessRepository::new();
            if let Some(user) = bootstrap {
                tracing::info!(user_name = %user.user_name, "Bootstrap admin created");
                repo.insert_user(user).await;
            }
            build_state(repo, config).await
        }
    };

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static(STEP_UP_HEADER),
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env::var("API_BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:31113".to_string())
        .parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Clear elapsed lockouts, then mount the access routes.
async fn build_state<R>(repo: R, config: AccessConfig) -> Router
where
    R: AccessRepository,
{
    let state = AccessAppState::new(repo, config);

    // Errors here should not prevent server startup
    let tracker: AttemptTracker<R> = state.tracker();
    match tracker.cleanup_expired().await {
        Ok(cleared) => {
            tracing::info!(attempts_deleted = cleared, "Lockout cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Lockout cleanup failed, continuing anyway");
        }
    }

    access_router(state)
}

/// First administrator account, read from the environment when both
/// variables are set.
fn bootstrap_admin(config: &AccessConfig) -> anyhow::Result<Option<User>> {
    let (Ok(user_name), Ok(password)) = (
        env::var(ENV_BOOTSTRAP_ADMIN_USER),
        env::var(ENV_BOOTSTRAP_ADMIN_PASSWORD),
    ) else {
        return Ok(None);
    };

    let hash = ClearTextPassword::new(password)?.hash(config.pepper())?;
    Ok(Some(User::new(
        user_name,
        Role::Admin,
        None,
        hash.as_phc_string(),
    )))
}
