//! Block store
//!
//! Per-height accumulator of quotes and price records. The quote poller and
//! the entry downloader write to it independently; the comparison pipeline
//! and the dashboard read cloned snapshots of it.

mod snapshot;

pub use snapshot::Snapshot;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ledger::Submission;
use crate::types::{Asset, AssetBasket, FixedPrice, Height, PriceQuote};

/// Label for the `index`-th distinct record of a miner in one block
pub fn variant_label(submitter: &str, index: usize) -> String {
    if index == 0 {
        submitter.to_string()
    } else {
        format!("{} ({})", submitter, index + 1)
    }
}

/// Everything known about one height
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalState {
    pub height: Height,
    /// asset -> source -> quote
    pub quotes: BTreeMap<Asset, BTreeMap<String, FixedPrice>>,
    /// miner id -> distinct records, in arrival order
    pub submissions: BTreeMap<String, Vec<Submission>>,
}

impl IntervalState {
    pub fn new(height: Height) -> Self {
        Self {
            height,
            ..Default::default()
        }
    }

    /// Merge quotes in; a later quote for the same (asset, source) replaces the earlier one
    pub fn merge_quotes(&mut self, quotes: impl IntoIterator<Item = PriceQuote>) {
        for q in quotes {
            self.quotes
                .entry(q.asset)
                .or_default()
                .insert(q.source, q.value);
        }
    }

    /// Add a record unless the same miner already posted identical content.
    /// Returns whether it was new.
    pub fn add_submission(&mut self, submission: Submission) -> bool {
        let records = self
            .submissions
            .entry(submission.submitter.clone())
            .or_default();
        if records
            .iter()
            .any(|s| s.content_hash == submission.content_hash)
        {
            return false;
        }
        records.push(submission);
        true
    }

    pub fn has_quotes(&self) -> bool {
        self.quotes.values().any(|q| !q.is_empty())
    }

    pub fn has_submissions(&self) -> bool {
        self.submissions.values().any(|s| !s.is_empty())
    }

    /// Quotes for `asset`, `None` when no source delivered one
    pub fn quotes_for(&self, asset: &Asset) -> Option<&BTreeMap<String, FixedPrice>> {
        self.quotes.get(asset).filter(|q| !q.is_empty())
    }

    /// Every record with its display label, miners in id order
    pub fn variants(&self) -> impl Iterator<Item = (String, &Submission)> + '_ {
        self.submissions.iter().flat_map(|(submitter, records)| {
            records
                .iter()
                .enumerate()
                .map(move |(i, s)| (variant_label(submitter, i), s))
        })
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.values().map(Vec::len).sum()
    }
}

/// Per-asset view served to the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetView {
    /// source -> quote
    pub sources: BTreeMap<String, f64>,
    /// labelled miner record -> submitted value
    pub miners: BTreeMap<String, f64>,
}

/// Read-only summary of one height
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: Height,
    pub has_quotes: bool,
    pub has_submissions: bool,
    pub assets: BTreeMap<Asset, AssetView>,
}

/// Concurrency-safe map from height to interval state
#[derive(Debug)]
pub struct BlockStore {
    basket: AssetBasket,
    blocks: RwLock<BTreeMap<Height, IntervalState>>,
}

impl BlockStore {
    pub fn new(basket: AssetBasket) -> Self {
        Self {
            basket,
            blocks: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn basket(&self) -> &AssetBasket {
        &self.basket
    }

    /// Merge quotes into `height`, creating the state if needed
    pub fn record_quotes(&self, height: Height, quotes: Vec<PriceQuote>) {
        let mut blocks = self.blocks.write();
        blocks
            .entry(height)
            .or_insert_with(|| IntervalState::new(height))
            .merge_quotes(quotes);
    }

    /// Merge records into `height`; returns how many were new
    pub fn record_submissions(&self, height: Height, submissions: Vec<Submission>) -> usize {
        let mut blocks = self.blocks.write();
        let state = blocks
            .entry(height)
            .or_insert_with(|| IntervalState::new(height));
        let mut added = 0;
        for submission in submissions {
            if state.add_submission(submission) {
                added += 1;
            }
        }
        added
    }

    /// Cloned state for `height`
    pub fn interval(&self, height: Height) -> Option<IntervalState> {
        self.blocks.read().get(&height).cloned()
    }

    /// Known heights, most recent first
    pub fn block_list(&self) -> Vec<Height> {
        self.blocks.read().keys().rev().copied().collect()
    }

    pub fn block_info(&self, height: Height) -> Option<BlockInfo> {
        let state = self.interval(height)?;

        let mut assets: BTreeMap<Asset, AssetView> = self
            .basket
            .compared()
            .map(|a| (a.clone(), AssetView::default()))
            .collect();
        let mut has_quotes = false;
        let mut has_submissions = false;

        for (asset, quotes) in &state.quotes {
            if let Some(view) = assets.get_mut(asset) {
                for (source, value) in quotes {
                    view.sources.insert(source.clone(), value.to_f64());
                    has_quotes = true;
                }
            }
        }

        for (label, submission) in state.variants() {
            for (asset, value) in &submission.values {
                if let Some(view) = assets.get_mut(asset) {
                    view.miners.insert(label.clone(), value.to_f64());
                    has_submissions = true;
                }
            }
        }

        Some(BlockInfo {
            height,
            has_quotes,
            has_submissions,
            assets,
        })
    }

    /// Copy of everything, for persistence
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.blocks.read().clone())
    }

    /// Merge a snapshot's blocks into the store
    pub fn restore(&self, snapshot: Snapshot) {
        let mut blocks = self.blocks.write();
        for (height, state) in snapshot.blocks {
            let target = blocks
                .entry(height)
                .or_insert_with(|| IntervalState::new(height));
            target.merge_quotes(state.quotes.into_iter().flat_map(|(asset, sources)| {
                sources.into_iter().map(move |(source, value)| PriceQuote {
                    asset: asset.clone(),
                    source,
                    value,
                })
            }));
            for submission in state.submissions.into_values().flatten() {
                target.add_submission(submission);
            }
        }
    }
}
