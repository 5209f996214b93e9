use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

use jobtrack_client::{CareerOneStopClient, GoogleMapsGeocoder, OnetClient};
use jobtrack_core::reconcile::{ReconcileConfig, ReconcileEngine};
use jobtrack_db::{Database, OccupationRepository, ProgramRepository};
use jobtrack_server::routes;
use jobtrack_server::state::AppState;

pub const TEST_API_KEY: &str = "test-secret-key";

const MIGRATIONS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS occupation_records (
        code VARCHAR(20) PRIMARY KEY,
        document JSONB NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_occupation_records_updated
        ON occupation_records(updated_at DESC)"#,
    r#"CREATE TABLE IF NOT EXISTS academic_programs (
        code INTEGER PRIMARY KEY,
        document JSONB NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS idx_academic_programs_title
        ON academic_programs ((LOWER(document->>'title')))"#,
    r#"CREATE INDEX IF NOT EXISTS idx_academic_programs_careers
        ON academic_programs USING GIN ((document->'careers'))"#,
];

pub struct TestApp {
    pub router: Router,
    pub repo: OccupationRepository,
    pub programs: ProgramRepository,
}

/// Spin up a PostgreSQL container and return the test app + container handle.
///
/// The upstream API clients carry dummy credentials; tests only exercise
/// routes that read the database or return before any upstream call.
pub async fn setup_test_app() -> (TestApp, ContainerAsync<GenericImage>) {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "jobtrack_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let url = format!("postgresql://postgres:postgres@{host}:{port}/jobtrack_test");

    const MAX_RETRIES: u32 = 30;
    let mut retries = 0;
    let pool = loop {
        match PgPoolOptions::new().max_connections(5).connect(&url).await {
            Ok(pool) => break pool,
            Err(e) => {
                retries += 1;
                if retries >= MAX_RETRIES {
                    panic!("Failed to connect to database after {MAX_RETRIES} retries: {e}");
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    };

    for migration in MIGRATIONS {
        sqlx::query(migration)
            .execute(&pool)
            .await
            .expect("Failed to run migration");
    }

    let db = Database::from_pool(pool);
    let repo = db.occupation_repo();
    let programs = db.program_repo();

    let geocoder = GoogleMapsGeocoder::new("test-maps-key").expect("geocoder");
    let careers = CareerOneStopClient::new("test-user", "test-token").expect("careers client");
    let onet = OnetClient::new("Basic dGVzdA==").expect("onet client");
    let engine = ReconcileEngine::new(
        geocoder,
        careers.clone(),
        repo.clone(),
        ReconcileConfig {
            batch_size: 10,
            batch_delay: Duration::ZERO,
            lookback_days: 30,
        },
    );

    let state = Arc::new(AppState {
        db,
        engine,
        careers,
        onet,
        api_key: TEST_API_KEY.to_string(),
    });

    (
        TestApp {
            router: routes::router(state),
            repo,
            programs,
        },
        container,
    )
}
