//! Ledger module - timing signals and oracle price records
//!
//! The ledger produces one directory block per interval, split into ten
//! minutes. Miners post their price records into a dedicated chain; this
//! module fetches them and turns them into validated submissions.

mod entry;
mod factomd;
mod monitor;

pub use entry::{EntryError, EntryParser, RecordContent, Submission};
pub use factomd::FactomdClient;
pub use monitor::TickMonitor;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::Height;

/// Position in the ledger's block cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingInfo {
    /// Height of the block currently being built
    pub height: Height,
    /// Minute marker within that block (0-9)
    pub minute: u8,
}

impl TimingInfo {
    /// Minutes until `trigger` comes around again
    pub fn minutes_until(&self, trigger: u8) -> u8 {
        (10 + trigger - self.minute % 10) % 10
    }
}

/// One raw chain entry, before any validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub ext_ids: Vec<Vec<u8>>,
    pub content: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{method} returned error {code}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },
    #[error("{0} returned no result")]
    EmptyResult(String),
    #[error("no oracle entry block at height {0}")]
    ChainNotFound(Height),
    #[error("invalid hex in entry: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Read access to the ledger
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Current in-progress height and minute
    async fn current_timing(&self) -> Result<TimingInfo, LedgerError>;

    /// All oracle chain entries recorded in the block at `height`
    async fn entries_for_height(&self, height: Height) -> Result<Vec<RawEntry>, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_until_wraps_around_block() {
        let at = |minute| TimingInfo { height: 1, minute };
        assert_eq!(at(1).minutes_until(1), 0);
        assert_eq!(at(2).minutes_until(1), 9);
        assert_eq!(at(9).minutes_until(1), 2);
        assert_eq!(at(0).minutes_until(1), 1);
    }
}
