use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jobtrack_client::{CareerOneStopClient, GoogleMapsGeocoder, OnetClient};
use jobtrack_core::reconcile::{ReconcileConfig, ReconcileReport};
use jobtrack_core::ReconcileEngine;
use jobtrack_db::{Database, DatabaseConfig, OccupationRepository};

type Engine = ReconcileEngine<GoogleMapsGeocoder, CareerOneStopClient, OccupationRepository>;

#[derive(Parser)]
#[command(name = "jobtrack", version, about = "Career and job-posting data aggregator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh job data for one occupation code
    Refresh {
        /// Occupation code, e.g. 15-1134.00
        #[arg(short, long)]
        code: String,

        /// Location keyword (zip, state, ...) to fold into the tracked areas
        #[arg(short, long)]
        location: Option<String>,

        /// Provider requests dispatched per batch
        #[arg(long, default_value_t = 10)]
        batch_size: usize,

        /// Pause between batches, in milliseconds
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,
    },

    /// Refresh every occupation code in the database
    RefreshAll {
        #[arg(long, default_value_t = 10)]
        batch_size: usize,

        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,
    },

    /// Print the persisted document for an occupation code
    Show {
        #[arg(short, long)]
        code: String,
    },

    /// Print the technical skills O*NET lists for an occupation code
    Skills {
        #[arg(short, long)]
        code: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobtrack=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Refresh {
            code,
            location,
            batch_size,
            delay_ms,
        } => {
            let repo = connect_db().await?;
            let engine = build_engine(repo, batch_size, delay_ms)?;
            let report = engine
                .refresh(&code, location.as_deref())
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
            print_report(&report);
        }
        Commands::RefreshAll {
            batch_size,
            delay_ms,
        } => {
            let repo = connect_db().await?;
            let engine = build_engine(repo, batch_size, delay_ms)?;
            let outcome = engine.refresh_all().await.map_err(|e| anyhow::anyhow!(e))?;
            for report in &outcome.reports {
                print_report(report);
            }
            if !outcome.failed.is_empty() {
                tracing::warn!(codes = ?outcome.failed, "codes failed both passes");
            }
            println!(
                "refreshed {} occupation(s), {} failed",
                outcome.reports.len(),
                outcome.failed.len()
            );
        }
        Commands::Show { code } => {
            let repo = connect_db().await?;
            match repo.get(&code).await.map_err(|e| anyhow::anyhow!(e))? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => anyhow::bail!("no document for {code}"),
            }
        }
        Commands::Skills { code } => {
            let auth = std::env::var("ONET_AUTHORIZATION")
                .context("ONET_AUTHORIZATION not set. Required for skills command.")?;
            let onet = OnetClient::new(auth).map_err(|e| anyhow::anyhow!(e))?;
            let skills = onet
                .technical_skills(&code)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
            for skill in skills {
                println!("{skill}");
            }
        }
    }

    Ok(())
}

/// Connect to PostgreSQL using DATABASE_URL and run migrations.
async fn connect_db() -> Result<OccupationRepository> {
    let config = DatabaseConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let db = Database::connect(&config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.map_err(|e| anyhow::anyhow!(e))?;
    Ok(db.occupation_repo())
}

fn build_engine(repo: OccupationRepository, batch_size: usize, delay_ms: u64) -> Result<Engine> {
    let maps_key = std::env::var("GOOGLE_MAPS_API_KEY")
        .context("GOOGLE_MAPS_API_KEY not set. Required for refresh commands.")?;
    let cos_user = std::env::var("CAREER_ONE_STOP_USER_ID")
        .context("CAREER_ONE_STOP_USER_ID not set. Required for refresh commands.")?;
    let cos_token = std::env::var("CAREER_ONE_STOP_TOKEN")
        .context("CAREER_ONE_STOP_TOKEN not set. Required for refresh commands.")?;

    let geocoder = GoogleMapsGeocoder::new(maps_key).map_err(|e| anyhow::anyhow!(e))?;
    let search = CareerOneStopClient::new(cos_user, cos_token).map_err(|e| anyhow::anyhow!(e))?;

    let config = ReconcileConfig {
        batch_size,
        batch_delay: Duration::from_millis(delay_ms),
        ..ReconcileConfig::default()
    };
    Ok(ReconcileEngine::new(geocoder, search, repo, config))
}

fn print_report(report: &ReconcileReport) {
    println!(
        "{}: {} new area(s), {} unit(s) planned, {} record(s) written{}",
        report.code,
        report.new_areas.len(),
        report.units_planned,
        report.records_written,
        if report.full_upsert {
            " (full upsert)"
        } else {
            ""
        }
    );
}
