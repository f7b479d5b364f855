//! Closest-match resolver
//!
//! For one asset in one submission, decides which data source quoted the
//! value nearest to what the miner submitted.

use crate::types::FixedPrice;

/// One registered quote and its distance to the submitted value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub source: String,
    pub value: FixedPrice,
    /// |value - reference| in raw fixed-point units
    pub diff: u64,
}

/// Candidate set for a single asset/submission pair
#[derive(Debug, Clone, Default)]
pub struct ClosestMatch {
    candidates: Vec<Candidate>,
}

impl ClosestMatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source's quote against the submitted reference value.
    ///
    /// Registering a source a second time replaces its earlier candidate in
    /// place (last write wins), so registration order stays stable.
    pub fn register(&mut self, source: &str, value: FixedPrice, reference: FixedPrice) {
        let candidate = Candidate {
            source: source.to_string(),
            value,
            diff: value.abs_diff(reference),
        };

        match self.candidates.iter_mut().find(|c| c.source == source) {
            Some(existing) => *existing = candidate,
            None => self.candidates.push(candidate),
        }
    }

    /// Smallest diff across all candidates, `None` when nothing is registered
    pub fn min_diff(&self) -> Option<u64> {
        self.candidates.iter().map(|c| c.diff).min()
    }

    /// Closest candidate; the earliest registration wins among exact ties
    pub fn winner(&self) -> Option<&Candidate> {
        let min = self.min_diff()?;
        self.candidates.iter().find(|c| c.diff == min)
    }

    /// True iff `source` is tied for the smallest diff
    pub fn is_winner(&self, source: &str) -> bool {
        match self.min_diff() {
            Some(min) => self
                .candidates
                .iter()
                .any(|c| c.source == source && c.diff == min),
            None => false,
        }
    }

    /// Every candidate tied for the smallest diff, in registration order
    pub fn winners(&self) -> Vec<&Candidate> {
        match self.min_diff() {
            Some(min) => self.candidates.iter().filter(|c| c.diff == min).collect(),
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
