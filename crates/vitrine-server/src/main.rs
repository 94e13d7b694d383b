use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use vitrine_api::auth::{AppState, AppStateInner};
use vitrine_api::cache::{CATEGORY_CACHE_TTL, CategoryCache};
use vitrine_api::mailer::Mailer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vitrine=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("VITRINE_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("VITRINE_DB_PATH").unwrap_or_else(|_| "vitrine.db".into());
    let host = std::env::var("VITRINE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("VITRINE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let base_url = std::env::var("VITRINE_BASE_URL")
        .unwrap_or_else(|_| format!("http://localhost:{port}"));

    // Init database
    let db = vitrine_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        base_url,
        categories: CategoryCache::new(CATEGORY_CACHE_TTL),
        mailer: Mailer::from_env()?,
    });

    let app: Router = vitrine_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Vitrine server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
