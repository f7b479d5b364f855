//! Matchup tally and source ranking
//!
//! Every source is a "player". For every asset, each eligible source is
//! matched against every other eligible source; the ones closest to the
//! miner's value win those matchups. Sources are ranked by the share of
//! matchups they won.

use std::cmp::Ordering;
use std::collections::HashMap;

/// Counters for a single source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Record {
    pub wins: u64,
    pub matchups: u64,
}

impl Record {
    /// Win ratio, `None` when the source never played
    pub fn score(&self) -> Option<f64> {
        if self.matchups == 0 {
            None
        } else {
            Some(self.wins as f64 / self.matchups as f64)
        }
    }

    /// Exact ratio comparison, higher ratio first; unplayed records sort last.
    fn cmp_ratio(&self, other: &Record) -> Ordering {
        match (self.matchups, other.matchups) {
            (0, 0) => Ordering::Equal,
            (0, _) => Ordering::Greater,
            (_, 0) => Ordering::Less,
            _ => {
                let lhs = self.wins as u128 * other.matchups as u128;
                let rhs = other.wins as u128 * self.matchups as u128;
                rhs.cmp(&lhs)
            }
        }
    }
}

/// Accumulated matchup results for a set of sources
#[derive(Debug, Clone, Default)]
pub struct MatchupTally {
    records: HashMap<String, Record>,
    reference: Option<String>,
}

impl MatchupTally {
    /// Create a tally pre-populated with `sources`; `reference` always ranks first.
    pub fn new<I, S>(sources: I, reference: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            records: sources
                .into_iter()
                .map(|s| (s.into(), Record::default()))
                .collect(),
            reference: reference.map(str::to_string),
        }
    }

    /// Credit `matchups` to `source`, and as many wins if it won.
    pub fn record(&mut self, source: &str, matchups: u64, won: bool) {
        let entry = self.records.entry(source.to_string()).or_default();
        entry.matchups += matchups;
        if won {
            entry.wins += matchups;
        }
    }

    pub fn has_won(&self, source: &str) -> bool {
        self.get(source).wins > 0
    }

    pub fn get(&self, source: &str) -> Record {
        self.records.get(source).copied().unwrap_or_default()
    }

    pub fn is_reference(&self, source: &str) -> bool {
        self.reference.as_deref() == Some(source)
    }

    /// Ordering used for reports: reference source first, then win ratio descending.
    pub fn rank(&self, a: &str, b: &str) -> Ordering {
        match (self.is_reference(a), self.is_reference(b)) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
        self.get(a).cmp_ratio(&self.get(b))
    }

    /// Sort `sources` by `rank`; equal sources keep their given (priority) order.
    pub fn ranked<S: AsRef<str> + Clone>(&self, sources: &[S]) -> Vec<S> {
        let mut out = sources.to_vec();
        out.sort_by(|a, b| self.rank(a.as_ref(), b.as_ref()));
        out
    }

    pub fn total_wins(&self) -> u64 {
        self.records.values().map(|r| r.wins).sum()
    }

    pub fn total_matchups(&self) -> u64 {
        self.records.values().map(|r| r.matchups).sum()
    }
}
