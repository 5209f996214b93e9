use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use jobtrack_client::{CareerOneStopClient, GoogleMapsGeocoder, OnetClient};
use jobtrack_core::reconcile::{ReconcileConfig, ReconcileEngine};
use jobtrack_db::{Database, DatabaseConfig};
use jobtrack_server::routes;
use jobtrack_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobtrack=info".parse()?))
        .with_target(false)
        .init();

    let api_key = std::env::var("JOBTRACK_SERVER_API_KEY")
        .context("JOBTRACK_SERVER_API_KEY must be set")?;
    let port = std::env::var("JOBTRACK_SERVER_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");

    let maps_key =
        std::env::var("GOOGLE_MAPS_API_KEY").context("GOOGLE_MAPS_API_KEY must be set")?;
    let cos_user = std::env::var("CAREER_ONE_STOP_USER_ID")
        .context("CAREER_ONE_STOP_USER_ID must be set")?;
    let cos_token =
        std::env::var("CAREER_ONE_STOP_TOKEN").context("CAREER_ONE_STOP_TOKEN must be set")?;
    let onet_auth =
        std::env::var("ONET_AUTHORIZATION").context("ONET_AUTHORIZATION must be set")?;

    let db = Database::connect(&DatabaseConfig::from_env()?).await?;
    db.migrate().await?;

    let geocoder = GoogleMapsGeocoder::new(maps_key)?;
    let careers = CareerOneStopClient::new(cos_user, cos_token)?;
    let onet = OnetClient::new(onet_auth)?;
    let engine = ReconcileEngine::new(
        geocoder,
        careers.clone(),
        db.occupation_repo(),
        reconcile_config_from_env()?,
    );

    let state = Arc::new(AppState {
        db,
        engine,
        careers,
        onet,
        api_key,
    });

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn reconcile_config_from_env() -> anyhow::Result<ReconcileConfig> {
    let mut config = ReconcileConfig::default();
    if let Ok(raw) = std::env::var("JOBTRACK_BATCH_SIZE") {
        config.batch_size = raw.parse().context("invalid JOBTRACK_BATCH_SIZE")?;
    }
    if let Ok(raw) = std::env::var("JOBTRACK_BATCH_DELAY_MS") {
        config.batch_delay =
            Duration::from_millis(raw.parse().context("invalid JOBTRACK_BATCH_DELAY_MS")?);
    }
    if let Ok(raw) = std::env::var("JOBTRACK_LOOKBACK_DAYS") {
        config.lookback_days = raw.parse().context("invalid JOBTRACK_LOOKBACK_DAYS")?;
    }
    Ok(config)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    tracing::info!("Shutdown signal received");
}
