//! Source comparison
//!
//! Closest-match resolution per asset, matchup tallies across assets and
//! miners, and the per-block pipeline that ties them together.

mod closest;
mod pipeline;
mod report;
mod tally;

pub use closest::{Candidate, ClosestMatch};
pub use pipeline::Comparison;
pub use report::{BandReport, ComparisonReport, RankedSource, Ranking, SubmissionRanking};
pub use tally::{MatchupTally, Record};
