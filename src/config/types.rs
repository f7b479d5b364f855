//! Configuration section types

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// factomd API endpoint (without the /v2 suffix)
    pub factomd_url: String,
    /// Chain holding the oracle price records
    pub chain_id: String,
    /// How often the tick monitor polls for the current minute
    pub poll_interval_ms: u64,
    /// Minute of the block on which a fetch+compare cycle runs
    pub trigger_minute: u8,
    /// Oldest record version byte accepted
    pub min_version: u8,
    /// Per-request timeout
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    /// Tracked assets in record order (the order miners submit values in)
    pub tracked: Vec<String>,
    /// Unit-of-account asset, never compared
    pub reference: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Enabled data sources, highest priority first
    pub order: Vec<String>,
    /// Source exempt from accuracy ranking, always listed first
    pub reference: String,
    /// Per-request timeout for price APIs
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BandConfig {
    /// Allowed distance from the top-priority quote, in basis points
    pub tolerance_bps: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotConfig {
    /// Dump the whole store here after every tick
    pub save_path: Option<String>,
    /// Load this snapshot and replay it instead of polling the network
    pub replay_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of the human-readable format
    #[serde(default)]
    pub json: bool,
}
