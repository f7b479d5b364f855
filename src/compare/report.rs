//! Comparison reports
//!
//! Plain data produced by the pipeline, with `Display` impls that render the
//! line-oriented text format printed after every block.

use serde::Serialize;
use std::fmt;

use super::tally::MatchupTally;
use crate::types::Height;

const RULE: &str = "========================================================";

/// One source's place in a ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedSource {
    pub name: String,
    /// Position in the full ranked list (0 = best)
    pub rank: usize,
    pub wins: u64,
    pub matchups: u64,
}

impl fmt::Display for RankedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.rank)
    }
}

/// Ranked sources split into those that won at least once and the rest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ranking {
    pub used: Vec<RankedSource>,
    pub unused: Vec<RankedSource>,
}

impl Ranking {
    /// Rank `sources` (given in priority order) by `tally`.
    ///
    /// The reference source always lands in `used`, at rank 0.
    pub fn from_tally(tally: &MatchupTally, sources: &[String]) -> Self {
        let mut ranking = Ranking::default();
        for (rank, name) in tally.ranked(sources).into_iter().enumerate() {
            let record = tally.get(&name);
            let used = tally.has_won(&name) || tally.is_reference(&name);
            let entry = RankedSource {
                name,
                rank,
                wins: record.wins,
                matchups: record.matchups,
            };
            if used {
                ranking.used.push(entry);
            } else {
                ranking.unused.push(entry);
            }
        }
        ranking
    }

    /// Names in rank order, used first
    pub fn order(&self) -> Vec<&str> {
        self.used
            .iter()
            .chain(self.unused.iter())
            .map(|s| s.name.as_str())
            .collect()
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, label: &str, group: &[RankedSource]) -> fmt::Result {
    write!(f, "  {}:", label)?;
    for source in group {
        write!(f, " {}", source)?;
    }
    writeln!(f)
}

/// Ranking for one miner record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRanking {
    /// Miner id, with " (n)" for second and later distinct records
    pub label: String,
    pub ranking: Ranking,
}

/// Everything learned from one block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonReport {
    pub height: Height,
    pub submissions: Vec<SubmissionRanking>,
    pub total: Ranking,
}

impl ComparisonReport {
    fn write_section(f: &mut fmt::Formatter<'_>, title: &str, ranking: &Ranking) -> fmt::Result {
        writeln!(f, "{}", title)?;
        write_group(f, "Used", &ranking.used)?;
        if !ranking.unused.is_empty() {
            write_group(f, "Unused", &ranking.unused)?;
        }
        Ok(())
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=============== Report for Height {} ===============",
            self.height
        )?;
        for submission in &self.submissions {
            let title = format!("OPR [miner = {}]", submission.label);
            Self::write_section(f, &title, &submission.ranking)?;
        }
        writeln!(f, "{}", RULE)?;
        Self::write_section(f, "Total", &self.total)?;
        write!(f, "{}", RULE)
    }
}

/// Result of the tolerance band check for one block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BandReport {
    pub height: Height,
    pub inside: usize,
    pub total: usize,
    pub tolerance_bps: u32,
}

impl BandReport {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.inside as f64 / self.total as f64 * 100.0
        }
    }
}

impl fmt::Display for BandReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Current priority order is within {:.2}% of {} of {} miners ({:.2}%)",
            self.tolerance_bps as f64 / 100.0,
            self.inside,
            self.total,
            self.percentage()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> Vec<String> {
        ["FixedUSD", "A", "B", "C"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn partitions_used_and_unused() {
        let mut tally = MatchupTally::new(sources(), Some("FixedUSD"));
        tally.record("A", 2, false);
        tally.record("B", 2, true);
        tally.record("C", 2, false);

        let ranking = Ranking::from_tally(&tally, &sources());
        assert_eq!(ranking.order(), vec!["FixedUSD", "B", "A", "C"]);
        assert_eq!(ranking.used.len(), 2);
        assert_eq!(ranking.unused[0].rank, 2);
        assert_eq!(ranking.unused[1].rank, 3);
    }

    #[test]
    fn renders_report_text() {
        let mut tally = MatchupTally::new(sources(), Some("FixedUSD"));
        tally.record("A", 2, true);
        tally.record("B", 2, false);
        tally.record("C", 2, false);
        let ranking = Ranking::from_tally(&tally, &sources());

        let report = ComparisonReport {
            height: 7,
            submissions: vec![SubmissionRanking {
                label: "m1 (2)".to_string(),
                ranking: ranking.clone(),
            }],
            total: ranking,
        };

        let expected = "\
=============== Report for Height 7 ===============
OPR [miner = m1 (2)]
  Used: FixedUSD=0 A=1
  Unused: B=2 C=3
========================================================
Total
  Used: FixedUSD=0 A=1
  Unused: B=2 C=3
========================================================";
        assert_eq!(report.to_string(), expected);
    }

    #[test]
    fn renders_band_line() {
        let band = BandReport {
            height: 1,
            inside: 3,
            total: 4,
            tolerance_bps: 100,
        };
        assert_eq!(
            band.to_string(),
            "Current priority order is within 1.00% of 3 of 4 miners (75.00%)"
        );
    }
}
