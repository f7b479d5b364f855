//! Oracle price record parsing
//!
//! Turns raw chain entries into submissions, discarding anything that fails
//! the structural checks.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use thiserror::Error;

use super::RawEntry;
use crate::types::{Asset, AssetBasket, FixedPrice, Height};

/// Length of the self-reported difficulty external id
const DIFFICULTY_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum EntryError {
    #[error("expected 3 external ids, found {0}")]
    ExtIdCount(usize),
    #[error("difficulty must be 8 bytes, found {0}")]
    DifficultyLength(usize),
    #[error("record version {found:?} is older than {min}")]
    Version { found: Option<u8>, min: u8 },
    #[error("malformed content: {0}")]
    Content(#[from] serde_json::Error),
    #[error("record has no miner id")]
    MissingId,
    #[error("declared {found} assets, expected {expected}")]
    AssetCount { expected: usize, found: usize },
    #[error("declared height {declared}, expected {expected}")]
    HeightMismatch { declared: Height, expected: Height },
}

/// Wire format of a price record's content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordContent {
    /// Payout address
    #[serde(default)]
    pub address: String,
    /// Miner identity
    pub id: String,
    pub height: Height,
    /// Fixed-point values, in basket order
    pub assets: Vec<u64>,
    /// Previous block's winning record hashes
    #[serde(default)]
    pub winners: Vec<String>,
}

/// A validated price record from one miner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub submitter: String,
    #[serde(default)]
    pub address: String,
    pub height: Height,
    /// Hex SHA-256 of the raw content; identifies byte-identical reposts
    pub content_hash: String,
    pub values: BTreeMap<Asset, FixedPrice>,
}

impl Submission {
    pub fn value(&self, asset: &Asset) -> Option<FixedPrice> {
        self.values.get(asset).copied()
    }
}

/// Validates raw entries against the configured basket
#[derive(Debug, Clone)]
pub struct EntryParser<'a> {
    basket: &'a AssetBasket,
    min_version: u8,
}

impl<'a> EntryParser<'a> {
    pub fn new(basket: &'a AssetBasket, min_version: u8) -> Self {
        Self {
            basket,
            min_version,
        }
    }

    /// Parse and validate one entry found in the block at `height`
    pub fn parse(&self, entry: &RawEntry, height: Height) -> Result<Submission, EntryError> {
        if entry.ext_ids.len() != 3 {
            return Err(EntryError::ExtIdCount(entry.ext_ids.len()));
        }
        if entry.ext_ids[1].len() != DIFFICULTY_LEN {
            return Err(EntryError::DifficultyLength(entry.ext_ids[1].len()));
        }
        match entry.ext_ids[2].as_slice() {
            [version] if *version >= self.min_version => {}
            other => {
                return Err(EntryError::Version {
                    found: other.first().copied().filter(|_| other.len() == 1),
                    min: self.min_version,
                })
            }
        }

        let content: RecordContent = serde_json::from_slice(&entry.content)?;

        if content.id.trim().is_empty() {
            return Err(EntryError::MissingId);
        }
        if content.assets.len() != self.basket.len() {
            return Err(EntryError::AssetCount {
                expected: self.basket.len(),
                found: content.assets.len(),
            });
        }
        if content.height != height {
            return Err(EntryError::HeightMismatch {
                declared: content.height,
                expected: height,
            });
        }

        let values = self
            .basket
            .tracked()
            .iter()
            .cloned()
            .zip(content.assets.iter().map(|v| FixedPrice::from_raw(*v)))
            .collect();

        Ok(Submission {
            submitter: content.id,
            address: content.address,
            height: content.height,
            content_hash: hex::encode(Sha256::digest(&entry.content)),
            values,
        })
    }

    /// Parse every entry, logging and dropping the invalid ones
    pub fn parse_all(&self, entries: &[RawEntry], height: Height) -> Vec<Submission> {
        entries
            .iter()
            .filter_map(|entry| match self.parse(entry, height) {
                Ok(submission) => Some(submission),
                Err(e) => {
                    tracing::debug!(height, error = %e, "Discarding oracle record");
                    None
                }
            })
            .collect()
    }
}
