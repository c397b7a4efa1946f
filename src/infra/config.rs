//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SiteConfig {
    /// Deployment identifier carried in log lines (e.g., "tourtrack-eu")
    #[serde(default = "default_site_id")]
    pub id: String,
}

fn default_site_id() -> String {
    "tourtrack".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProximityConfig {
    /// Reward-qualification threshold, statute miles
    #[serde(default = "default_proximity_buffer_miles")]
    pub buffer_miles: f64,
    /// Attraction-discovery threshold, statute miles
    #[serde(default = "default_attraction_range_miles")]
    pub attraction_range_miles: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            buffer_miles: default_proximity_buffer_miles(),
            attraction_range_miles: default_attraction_range_miles(),
        }
    }
}

fn default_proximity_buffer_miles() -> f64 {
    10.0
}

fn default_attraction_range_miles() -> f64 {
    200.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Worker tasks per available core
    #[serde(default = "default_workers_per_core")]
    pub workers_per_core: usize,
    /// Hard cap on the pool, independent of core count
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { workers_per_core: default_workers_per_core(), max_workers: default_max_workers() }
    }
}

fn default_workers_per_core() -> usize {
    16
}

fn default_max_workers() -> usize {
    512
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    /// Seconds between periodic tracking batches
    #[serde(default = "default_tracking_interval_secs")]
    pub interval_secs: u64,
    /// Operational budget for one batch (0 to disable)
    #[serde(default = "default_batch_budget_secs")]
    pub batch_budget_secs: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_tracking_interval_secs(),
            batch_budget_secs: default_batch_budget_secs(),
        }
    }
}

fn default_tracking_interval_secs() -> u64 {
    300
}

fn default_batch_budget_secs() -> u64 {
    900
}

#[derive(Debug, Clone, Deserialize)]
pub struct PopulationConfig {
    /// Internal users seeded at startup for load exercises
    #[serde(default = "default_internal_user_count")]
    pub internal_user_count: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self { internal_user_count: default_internal_user_count() }
    }
}

fn default_internal_user_count() -> usize {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Upper bound on simulated GPS lookup latency, milliseconds (0 = none)
    #[serde(default = "default_gps_latency_ms")]
    pub gps_latency_ms: u64,
    /// Upper bound on simulated points lookup latency, milliseconds (0 = none)
    #[serde(default = "default_points_latency_ms")]
    pub points_latency_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gps_latency_ms: default_gps_latency_ms(),
            points_latency_ms: default_points_latency_ms(),
        }
    }
}

fn default_gps_latency_ms() -> u64 {
    100
}

fn default_points_latency_ms() -> u64 {
    200
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval_secs")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval_secs() }
    }
}

fn default_metrics_interval_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub proximity: ProximityConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub population: PopulationConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    site_id: String,
    proximity_buffer_miles: f64,
    attraction_range_miles: f64,
    workers_per_core: usize,
    max_workers: usize,
    tracking_interval_secs: u64,
    batch_budget_secs: u64,
    internal_user_count: usize,
    gps_latency_ms: u64,
    points_latency_ms: u64,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_id: default_site_id(),
            proximity_buffer_miles: default_proximity_buffer_miles(),
            attraction_range_miles: default_attraction_range_miles(),
            workers_per_core: default_workers_per_core(),
            max_workers: default_max_workers(),
            tracking_interval_secs: default_tracking_interval_secs(),
            batch_budget_secs: default_batch_budget_secs(),
            internal_user_count: default_internal_user_count(),
            gps_latency_ms: default_gps_latency_ms(),
            points_latency_ms: default_points_latency_ms(),
            metrics_interval_secs: default_metrics_interval_secs(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Determine config file path from args or environment
    pub fn resolve_config_path(args: &[String]) -> String {
        // Check for --config argument
        for (i, arg) in args.iter().enumerate() {
            if arg == "--config" {
                if let Some(path) = args.get(i + 1) {
                    return path.clone();
                }
            }
            if let Some(path) = arg.strip_prefix("--config=") {
                return path.to_string();
            }
        }

        // Check CONFIG_FILE environment variable
        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        // Default to dev.toml
        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self {
            site_id: toml_config.site.id,
            proximity_buffer_miles: toml_config.proximity.buffer_miles,
            attraction_range_miles: toml_config.proximity.attraction_range_miles,
            workers_per_core: toml_config.pool.workers_per_core,
            max_workers: toml_config.pool.max_workers,
            tracking_interval_secs: toml_config.tracking.interval_secs,
            batch_budget_secs: toml_config.tracking.batch_budget_secs,
            internal_user_count: toml_config.population.internal_user_count,
            gps_latency_ms: toml_config.simulation.gps_latency_ms,
            points_latency_ms: toml_config.simulation.points_latency_ms,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries the TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Worker pool size: workers_per_core x available cores, capped
    pub fn worker_pool_size(&self) -> usize {
        let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        (self.workers_per_core * cores).clamp(1, self.max_workers)
    }

    /// Batch budget as a duration, `None` when disabled
    pub fn batch_budget(&self) -> Option<Duration> {
        (self.batch_budget_secs > 0).then(|| Duration::from_secs(self.batch_budget_secs))
    }

    // Getters for all config fields
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn proximity_buffer_miles(&self) -> f64 {
        self.proximity_buffer_miles
    }

    pub fn attraction_range_miles(&self) -> f64 {
        self.attraction_range_miles
    }

    pub fn workers_per_core(&self) -> usize {
        self.workers_per_core
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn tracking_interval_secs(&self) -> u64 {
        self.tracking_interval_secs
    }

    pub fn batch_budget_secs(&self) -> u64 {
        self.batch_budget_secs
    }

    pub fn internal_user_count(&self) -> usize {
        self.internal_user_count
    }

    pub fn gps_latency_ms(&self) -> u64 {
        self.gps_latency_ms
    }

    pub fn points_latency_ms(&self) -> u64 {
        self.points_latency_ms
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to set the batch budget
    #[cfg(test)]
    pub fn with_batch_budget_secs(mut self, secs: u64) -> Self {
        self.batch_budget_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.site_id(), "tourtrack");
        assert_eq!(config.proximity_buffer_miles(), 10.0);
        assert_eq!(config.attraction_range_miles(), 200.0);
        assert_eq!(config.tracking_interval_secs(), 300);
        assert_eq!(config.internal_user_count(), 100);
        assert_eq!(config.metrics_interval_secs(), 10);
    }

    #[test]
    fn test_worker_pool_size_capped() {
        let config = Config::default();
        assert!(config.worker_pool_size() >= 1);
        assert!(config.worker_pool_size() <= config.max_workers());
    }

    #[test]
    fn test_batch_budget_disabled_at_zero() {
        let config = Config::default().with_batch_budget_secs(0);
        assert!(config.batch_budget().is_none());
    }

    #[test]
    fn test_resolve_config_path_default() {
        let args: Vec<String> = vec!["tourtrack".to_string()];
        assert_eq!(Config::resolve_config_path(&args), "config/dev.toml");
    }

    #[test]
    fn test_resolve_config_path_from_arg() {
        let args: Vec<String> = vec![
            "tourtrack".to_string(),
            "--config".to_string(),
            "config/prod.toml".to_string(),
        ];
        assert_eq!(Config::resolve_config_path(&args), "config/prod.toml");
    }

    #[test]
    fn test_resolve_config_path_from_arg_equals() {
        let args: Vec<String> =
            vec!["tourtrack".to_string(), "--config=config/staging.toml".to_string()];
        assert_eq!(Config::resolve_config_path(&args), "config/staging.toml");
    }
}
