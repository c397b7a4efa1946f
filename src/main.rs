//! TourTrack - tourist location tracking and rewards engine
//!
//! Periodically samples every user's position through the location oracle
//! and grants reward points for attractions within range, on a bounded
//! worker pool sized to the host.
//!
//! Module structure:
//! - `domain/` - Core business types (User, Attraction, VisitedLocation)
//! - `io/` - External collaborators (location oracle, points oracle)
//! - `services/` - Business logic (RewardsService, Dispatcher, Tracker)
//! - `infra/` - Infrastructure (Config, Metrics)

use clap::Parser;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::interval;
use tourtrack::domain::Attraction;
use tourtrack::infra::{Config, Metrics};
use tourtrack::io::{AttractionSource, SimulatedGps, SimulatedRewardCentral};
use tourtrack::services::{Dispatcher, RewardsService, Tracker, UserRegistry};
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// TourTrack - tourist tracking and rewards engine
#[derive(Parser, Debug)]
#[command(name = "tourtrack", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for per-reward visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("tourtrack starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        site_id = %config.site_id(),
        proximity_buffer_miles = %config.proximity_buffer_miles(),
        attraction_range_miles = %config.attraction_range_miles(),
        workers = %config.worker_pool_size(),
        tracking_interval_secs = %config.tracking_interval_secs(),
        batch_budget_secs = %config.batch_budget_secs(),
        internal_user_count = %config.internal_user_count(),
        "config_loaded"
    );

    // Simulated external collaborators; the engine only sees the traits.
    let gps = Arc::new(SimulatedGps::new().with_latency_ms(config.gps_latency_ms()));
    let reward_central =
        Arc::new(SimulatedRewardCentral::new().with_latency_ms(config.points_latency_ms()));

    // The attraction catalog is loaded once and shared read-only.
    let catalog: Arc<Vec<Attraction>> = Arc::new(gps.list_attractions());
    info!(attractions = %catalog.len(), "catalog_loaded");

    let metrics = Arc::new(Metrics::new());
    let rewards = Arc::new(RewardsService::new(catalog, reward_central, &config));
    let dispatcher = Arc::new(Dispatcher::new(
        rewards.clone(),
        gps.clone(),
        metrics.clone(),
        &config,
    ));

    let mut registry = UserRegistry::new();
    registry.seed_internal(config.internal_user_count());
    info!(users = %registry.len(), "population_seeded");

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Start the periodic tracker
    let tracker = Tracker::new(dispatcher.clone(), registry, &config);
    let tracker_handle = tokio::spawn(tracker.run(shutdown_rx.clone()));

    // Periodic metrics report
    let report_metrics = metrics.clone();
    let mut report_shutdown = shutdown_rx;
    let report_interval_secs = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut tick = interval(std::time::Duration::from_secs(report_interval_secs));
        loop {
            tokio::select! {
                _ = tick.tick() => report_metrics.report(),
                changed = report_shutdown.changed() => {
                    if changed.is_err() || *report_shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown_requested");

    // Stop scheduling new units, then let the tracker drain its batch.
    dispatcher.stop();
    shutdown_tx.send(true)?;
    let registry = tracker_handle.await?;

    metrics.report();

    // Sample query surface: the five closest attractions for one user.
    if let Some(user) = registry.all_users().next() {
        if let Ok(nearby) = rewards.nearby_attractions(user).await {
            info!(
                user = %user.user_name,
                nearby = %serde_json::to_string(&nearby)?,
                "nearby_attractions_sample"
            );
        }
    }

    info!(
        users = %registry.len(),
        total_rewards = %registry.total_rewards(),
        "tourtrack stopped"
    );
    Ok(())
}
