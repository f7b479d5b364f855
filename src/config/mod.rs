//! Configuration management for priority-compare
//!
//! Loads from config files + environment variables via .env

mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashSet;

use crate::types::{Asset, AssetBasket};

/// Oracle price record chain on mainnet
pub const DEFAULT_OPR_CHAIN: &str =
    "a642a8674f46696cc47fdb6b65f9c87b2a19c5ea8123b3d2f0c13b6f33a9d5ef";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub ledger: LedgerConfig,
    pub assets: AssetsConfig,
    pub sources: SourcesConfig,
    pub band: BandConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Self::builder()?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (PRIORITY_COMPARE__*)
            .add_source(Environment::with_prefix("PRIORITY_COMPARE").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Defaults only, without files or environment
    pub fn defaults() -> Result<Self> {
        let config = Self::builder()?
            .build()
            .context("Failed to build configuration")?;
        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(Config::builder()
            // Ledger defaults
            .set_default("ledger.factomd_url", "http://localhost:8088")?
            .set_default("ledger.chain_id", DEFAULT_OPR_CHAIN)?
            .set_default("ledger.poll_interval_ms", 1000)?
            .set_default("ledger.trigger_minute", 1)?
            .set_default("ledger.min_version", 4)?
            .set_default("ledger.request_timeout_ms", 10_000)?
            // Asset defaults
            .set_default(
                "assets.tracked",
                vec!["USD", "BTC", "ETH", "LTC", "BCH", "XLM", "ADA", "DASH", "ZEC"],
            )?
            .set_default("assets.reference", "USD")?
            // Source defaults
            .set_default("sources.order", vec!["FixedUSD", "Coinbase", "Binance", "CoinGecko"])?
            .set_default("sources.reference", "FixedUSD")?
            .set_default("sources.request_timeout_ms", 10_000)?
            // Band check defaults
            .set_default("band.tolerance_bps", 100)?
            // Dashboard defaults
            .set_default("dashboard.enabled", true)?
            .set_default("dashboard.port", 8080)?
            .set_default("logging.json", false)?)
    }

    /// Reject combinations the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.assets.tracked.is_empty() {
            bail!("assets.tracked must list at least one asset");
        }
        let mut seen = HashSet::new();
        for ticker in &self.assets.tracked {
            let asset = Asset::new(ticker);
            if !seen.insert(asset.clone()) {
                bail!("assets.tracked lists {} twice", asset);
            }
        }
        let reference = Asset::new(&self.assets.reference);
        if !self.assets.tracked.iter().any(|a| Asset::new(a) == reference) {
            bail!(
                "reference asset {} is not in assets.tracked",
                self.assets.reference
            );
        }
        if !self.sources.order.contains(&self.sources.reference) {
            bail!(
                "reference source {} is not in sources.order",
                self.sources.reference
            );
        }
        if self.ledger.trigger_minute > 9 {
            bail!(
                "ledger.trigger_minute must be 0..=9, got {}",
                self.ledger.trigger_minute
            );
        }
        if self.band.tolerance_bps == 0 {
            bail!("band.tolerance_bps must be positive");
        }
        Ok(())
    }

    /// Tracked assets in record order plus the reference unit
    pub fn basket(&self) -> AssetBasket {
        AssetBasket::new(
            self.assets.tracked.iter().map(Asset::new).collect(),
            Asset::new(&self.assets.reference),
        )
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "factomd={} assets={} sources={:?} band={}bps replay={}",
            self.ledger.factomd_url,
            self.assets.tracked.len(),
            self.sources.order,
            self.band.tolerance_bps,
            self.snapshot.replay_path.is_some()
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
