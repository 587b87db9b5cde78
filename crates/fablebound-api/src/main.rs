//! Fablebound API server entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use fablebound_api::error::AppError;
use fablebound_api::identity::FileIdentityProvider;
use fablebound_api::{routes, state, worker};
use fablebound_content::SceneLibrary;
use fablebound_core::identity::IdentityProvider;
use fablebound_core::narration::NarrationProvider;
use fablebound_core::store::ContentStore;
use fablebound_narrator::HttpNarrator;
use fablebound_store::PgContentStore;

fn required_env(name: &str) -> Result<String, AppError> {
    std::env::var(name)
        .map_err(|_| AppError::Config(format!("{name} environment variable must be set")))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Fablebound API server");

    // Read configuration from environment.
    let database_url = required_env("DATABASE_URL")?;
    let identity_file = required_env("IDENTITY_FILE")?;
    let narrator_api_key = required_env("NARRATOR_API_KEY")?;
    let narrator_url = std::env::var("NARRATOR_API_URL")
        .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
    let narrator_model =
        std::env::var("NARRATOR_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;

    // Create database connection pool and ensure the schema exists.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;
    let pg_store = PgContentStore::new(pool);
    pg_store.ensure_schema().await?;
    let store: Arc<dyn ContentStore> = Arc::new(pg_store);

    // Identity, scenes, and the narration provider.
    let identities: Arc<dyn IdentityProvider> =
        Arc::new(FileIdentityProvider::load(&PathBuf::from(identity_file))?);
    let scenes = Arc::new(SceneLibrary::builtin());
    let provider: Arc<dyn NarrationProvider> =
        Arc::new(HttpNarrator::new(narrator_url, narrator_api_key, narrator_model)?);

    // Spawn the narration worker; handlers feed it through the state.
    let (narration_tx, _worker_handle) = worker::spawn(store.clone(), provider, scenes.clone());

    // Build application state.
    let app_state = state::AppState::new(store, identities, scenes, narration_tx);

    // Build router.
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/sessions", routes::session::router())
        .nest("/api/v1/invites", routes::invite::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
