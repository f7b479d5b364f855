//! JSON snapshots of the block store
//!
//! Written after every tick when enabled, and loaded to replay a run without
//! touching the network.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::IntervalState;
use crate::types::Height;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub blocks: BTreeMap<Height, IntervalState>,
}

impl Snapshot {
    pub fn new(blocks: BTreeMap<Height, IntervalState>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            blocks,
        }
    }

    /// Write atomically: temp file next to the target, then rename
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to move snapshot into {}", path.display()))?;

        tracing::debug!(path = %path.display(), blocks = self.blocks.len(), "Snapshot saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_slice(&raw)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            anyhow::bail!(
                "snapshot {} has version {}, expected {}",
                path.display(),
                snapshot.version,
                SNAPSHOT_VERSION
            );
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::EntryParser;
    use crate::store::BlockStore;
    use crate::test_support::{basket, record};
    use crate::types::{Asset, FixedPrice, PriceQuote};

    #[test]
    fn round_trips_through_disk() {
        let basket = basket();
        let store = BlockStore::new(basket.clone());
        store.record_quotes(
            42,
            vec![PriceQuote {
                asset: Asset::new("BTC"),
                source: "A".to_string(),
                value: FixedPrice::from_raw(123_456_789),
            }],
        );
        let submission = EntryParser::new(&basket, 4)
            .parse(&record("m1", 41, &[1.0, 2.0, 3.0]), 41)
            .unwrap();
        store.record_submissions(41, vec![submission]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let snapshot = store.snapshot();
        snapshot.save(&path).unwrap();

        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);

        let restored = BlockStore::new(basket);
        restored.restore(loaded);
        assert_eq!(restored.interval(41), store.interval(41));
        assert_eq!(restored.interval(42), store.interval(42));
    }

    #[test]
    fn rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.json");
        let mut snapshot = Snapshot::new(BTreeMap::new());
        snapshot.version = 99;
        snapshot.save(&path).unwrap();
        assert!(Snapshot::load(&path).is_err());
    }
}
