//! Per-block comparison
//!
//! Runs every stored miner record through the closest-match resolver, asset
//! by asset, and folds the results into per-miner and global tallies. Works
//! on a cloned `IntervalState`, never on the live store.

use std::collections::BTreeSet;

use super::closest::ClosestMatch;
use super::report::{BandReport, ComparisonReport, Ranking, SubmissionRanking};
use super::tally::MatchupTally;
use crate::oracle::SourceRegistry;
use crate::store::IntervalState;
use crate::types::{Asset, AssetBasket};

pub struct Comparison<'a> {
    registry: &'a SourceRegistry,
    basket: &'a AssetBasket,
}

impl<'a> Comparison<'a> {
    pub fn new(registry: &'a SourceRegistry, basket: &'a AssetBasket) -> Self {
        Self { registry, basket }
    }

    fn tally(&self) -> MatchupTally {
        MatchupTally::new(self.registry.names(), Some(self.registry.reference()))
    }

    /// Rank the sources against every record in `state`.
    ///
    /// Returns `None` when the block has no quotes or no records yet.
    pub fn compare(&self, state: &IntervalState) -> Option<ComparisonReport> {
        if !state.has_quotes() || !state.has_submissions() {
            tracing::info!(height = state.height, "Not enough data yet to perform a comparison");
            return None;
        }

        let names = self.registry.names();
        let mut global = self.tally();
        let mut warned: BTreeSet<&Asset> = BTreeSet::new();
        let mut submissions = Vec::with_capacity(state.submission_count());

        for (label, submission) in state.variants() {
            let mut own = self.tally();

            for asset in self.basket.compared() {
                let Some(value) = submission.value(asset) else {
                    continue;
                };
                let Some(quotes) = state.quotes_for(asset) else {
                    if warned.insert(asset) {
                        tracing::warn!(
                            height = state.height,
                            asset = %asset,
                            submitter = %label,
                            "No quotes for asset, skipping (further skips for it logged at debug)"
                        );
                    } else {
                        tracing::debug!(
                            height = state.height,
                            asset = %asset,
                            submitter = %label,
                            "No quotes for asset, skipping"
                        );
                    }
                    continue;
                };

                let mut closest = ClosestMatch::new();
                for (source, quote) in quotes {
                    closest.register(source, *quote, value);
                }

                let eligible = self.registry.sources_for(asset);
                let matchups = (eligible.len() as u64).saturating_sub(1);
                for source in eligible {
                    let won = closest.is_winner(source);
                    global.record(source, matchups, won);
                    own.record(source, matchups, won);
                }
            }

            submissions.push(SubmissionRanking {
                label,
                ranking: Ranking::from_tally(&own, &names),
            });
        }

        Some(ComparisonReport {
            height: state.height,
            submissions,
            total: Ranking::from_tally(&global, &names),
        })
    }

    /// Count the records whose every compared asset sits within
    /// `tolerance_bps` of the top-priority source's quote.
    pub fn band_check(&self, state: &IntervalState, tolerance_bps: u32) -> Option<BandReport> {
        if !state.has_quotes() || !state.has_submissions() {
            tracing::info!(height = state.height, "Not enough data yet to perform a band check");
            return None;
        }

        let mut warned: BTreeSet<&Asset> = BTreeSet::new();
        let mut inside = 0;
        let mut total = 0;

        for (_, submission) in state.variants() {
            total += 1;
            let mut within = true;

            for asset in self.basket.compared() {
                let Some(value) = submission.value(asset) else {
                    continue;
                };
                let quote = self
                    .registry
                    .top_source(asset)
                    .and_then(|top| state.quotes_for(asset)?.get(top));
                let Some(quote) = quote else {
                    if warned.insert(asset) {
                        tracing::warn!(
                            height = state.height,
                            asset = %asset,
                            source = ?self.registry.top_source(asset),
                            "Top priority source has no quote, records count as outside"
                        );
                    }
                    within = false;
                    break;
                };

                if !value.within_bps(*quote, tolerance_bps) {
                    within = false;
                    break;
                }
            }

            if within {
                inside += 1;
            }
        }

        Some(BandReport {
            height: state.height,
            inside,
            total,
            tolerance_bps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::EntryParser;
    use crate::oracle::sources::FixedUsd;
    use crate::oracle::QuoteProvider;
    use crate::test_support::{basket, record, StubSource};
    use crate::types::{FixedPrice, Height, PriceQuote};
    use std::sync::Arc;

    const HEIGHT: Height = 100;

    fn registry() -> SourceRegistry {
        let providers: Vec<Arc<dyn QuoteProvider>> = vec![
            Arc::new(FixedUsd::new(Asset::new("USD"))),
            Arc::new(StubSource::new("A").supporting(&["BTC", "ETH"])),
            Arc::new(StubSource::new("B").supporting(&["BTC", "ETH"])),
            Arc::new(StubSource::new("C").supporting(&["BTC", "ETH"])),
        ];
        SourceRegistry::new(providers, &basket(), "FixedUSD").unwrap()
    }

    fn quotes(state: &mut IntervalState, asset: &str, values: &[(&str, f64)]) {
        state.merge_quotes(values.iter().map(|(source, v)| PriceQuote {
            asset: Asset::new(asset),
            source: source.to_string(),
            value: FixedPrice::from_f64(*v).unwrap(),
        }));
    }

    fn submit(state: &mut IntervalState, id: &str, btc: f64, eth: f64) {
        let basket = basket();
        let submission = EntryParser::new(&basket, 4)
            .parse(&record(id, HEIGHT, &[1.0, btc, eth]), HEIGHT)
            .unwrap();
        state.add_submission(submission);
    }

    fn report(state: &IntervalState) -> ComparisonReport {
        let registry = registry();
        let basket = basket();
        Comparison::new(&registry, &basket).compare(state).unwrap()
    }

    fn find<'r>(ranking: &'r Ranking, name: &str) -> &'r crate::compare::RankedSource {
        ranking
            .used
            .iter()
            .chain(ranking.unused.iter())
            .find(|s| s.name == name)
            .unwrap()
    }

    #[test]
    fn single_closest_source_takes_all_wins() {
        let mut state = IntervalState::new(HEIGHT);
        quotes(&mut state, "BTC", &[("A", 100.0), ("B", 101.0), ("C", 99.5)]);
        submit(&mut state, "m1", 100.0, 10.0);

        let report = report(&state);
        let total = &report.total;
        assert_eq!(total.order(), vec!["FixedUSD", "A", "B", "C"]);
        assert_eq!(find(total, "A").wins, 2);
        assert_eq!(find(total, "A").matchups, 2);
        assert_eq!(find(total, "B").wins, 0);
        assert_eq!(find(total, "C").wins, 0);
        assert_eq!(total.used.len(), 2);
    }

    #[test]
    fn tied_sources_both_win() {
        let mut state = IntervalState::new(HEIGHT);
        quotes(&mut state, "BTC", &[("A", 100.0), ("B", 100.0)]);
        submit(&mut state, "m1", 100.0, 10.0);

        let report = report(&state);
        assert!(report.total.used.iter().any(|s| s.name == "A"));
        assert!(report.total.used.iter().any(|s| s.name == "B"));
        assert_eq!(report.total.unused.len(), 1);
        assert_eq!(report.total.unused[0].name, "C");
    }

    #[test]
    fn win_and_matchup_totals_follow_eligible_count() {
        let mut state = IntervalState::new(HEIGHT);
        quotes(&mut state, "BTC", &[("A", 100.0), ("B", 100.0), ("C", 90.0)]);
        quotes(&mut state, "ETH", &[("A", 10.0), ("B", 11.0), ("C", 12.0)]);
        submit(&mut state, "m1", 100.0, 10.0);

        let report = report(&state);
        let total = &report.total;
        let k = 3u64;
        let wins: u64 = ["A", "B", "C"].iter().map(|s| find(total, s).wins).sum();
        let matchups: u64 = ["A", "B", "C"]
            .iter()
            .map(|s| find(total, s).matchups)
            .sum();
        // two tied winners on BTC, one winner on ETH
        assert_eq!(wins, (2 + 1) * (k - 1));
        assert_eq!(matchups, 2 * k * (k - 1));
        assert_eq!(find(total, "FixedUSD").matchups, 0);
    }

    #[test]
    fn asset_without_quotes_is_skipped() {
        let mut state = IntervalState::new(HEIGHT);
        quotes(&mut state, "ETH", &[("B", 10.0)]);
        submit(&mut state, "m1", 100.0, 10.0);

        let report = report(&state);
        let total = &report.total;
        assert_eq!(find(total, "A").matchups, 2);
        assert_eq!(find(total, "B").wins, 2);
        assert_eq!(find(total, "A").wins, 0);
    }

    #[test]
    fn unquoted_asset_skipped_for_every_submitter() {
        let mut state = IntervalState::new(HEIGHT);
        quotes(&mut state, "ETH", &[("A", 10.0), ("B", 11.0)]);
        submit(&mut state, "m1", 100.0, 10.0);
        submit(&mut state, "m2", 200.0, 11.0);
        submit(&mut state, "m3", 300.0, 11.0);

        // BTC never counts, so each record only competes on ETH
        let report = report(&state);
        assert_eq!(report.submissions.len(), 3);
        for submission in &report.submissions {
            assert_eq!(find(&submission.ranking, "A").matchups, 2);
        }
        assert_eq!(find(&report.total, "A").matchups, 6);
        assert_eq!(find(&report.total, "A").wins, 2);
        assert_eq!(find(&report.total, "B").wins, 4);
    }

    #[test]
    fn per_miner_and_variant_rankings() {
        let mut state = IntervalState::new(HEIGHT);
        quotes(&mut state, "BTC", &[("A", 100.0), ("B", 101.0), ("C", 99.0)]);
        quotes(&mut state, "ETH", &[("A", 10.0), ("B", 11.0), ("C", 12.0)]);
        submit(&mut state, "m1", 100.0, 10.0);
        submit(&mut state, "m1", 101.0, 11.0);
        submit(&mut state, "m2", 99.0, 12.0);

        let report = report(&state);
        let labels: Vec<&str> = report
            .submissions
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, vec!["m1", "m1 (2)", "m2"]);
        assert_eq!(report.submissions[0].ranking.order()[1], "A");
        assert_eq!(report.submissions[1].ranking.order()[1], "B");
        assert_eq!(report.submissions[2].ranking.order()[1], "C");
        // one third each; ties keep priority order
        assert_eq!(report.total.order(), vec!["FixedUSD", "A", "B", "C"]);
        assert!(report.total.unused.is_empty());
    }

    #[test]
    fn nothing_to_compare_without_data() {
        let registry = registry();
        let basket = basket();
        let comparison = Comparison::new(&registry, &basket);

        let mut only_quotes = IntervalState::new(HEIGHT);
        quotes(&mut only_quotes, "BTC", &[("A", 100.0)]);
        assert!(comparison.compare(&only_quotes).is_none());
        assert!(comparison.band_check(&only_quotes, 100).is_none());

        let mut only_records = IntervalState::new(HEIGHT);
        submit(&mut only_records, "m1", 100.0, 10.0);
        assert!(comparison.compare(&only_records).is_none());
        assert!(comparison.band_check(&only_records, 100).is_none());
    }

    #[test]
    fn band_check_is_inclusive_at_the_edge() {
        let registry = registry();
        let basket = basket();
        let comparison = Comparison::new(&registry, &basket);

        let mut state = IntervalState::new(HEIGHT);
        // only A's quote matters: it is the top priority source for both
        quotes(&mut state, "BTC", &[("A", 100.0), ("B", 200.0)]);
        quotes(&mut state, "ETH", &[("A", 10.0), ("B", 20.0)]);
        submit(&mut state, "edge", 101.0, 9.9);
        submit(&mut state, "inside", 100.5, 10.0);
        submit(&mut state, "outside", 101.01, 10.0);
        submit(&mut state, "eth_out", 100.0, 10.2);

        let band = comparison.band_check(&state, 100).unwrap();
        assert_eq!(band.inside, 2);
        assert_eq!(band.total, 4);
        assert_eq!(band.percentage(), 50.0);
    }

    #[test]
    fn missing_top_quote_counts_as_outside() {
        let registry = registry();
        let basket = basket();
        let comparison = Comparison::new(&registry, &basket);

        let mut state = IntervalState::new(HEIGHT);
        quotes(&mut state, "BTC", &[("A", 100.0)]);
        quotes(&mut state, "ETH", &[("B", 10.0)]);
        submit(&mut state, "m1", 100.0, 10.0);

        let band = comparison.band_check(&state, 100).unwrap();
        assert_eq!(band.inside, 0);
        assert_eq!(band.total, 1);
    }

    #[test]
    fn top_source_down_leaves_nobody_inside() {
        let registry = registry();
        let basket = basket();
        let comparison = Comparison::new(&registry, &basket);

        let mut state = IntervalState::new(HEIGHT);
        quotes(&mut state, "BTC", &[("B", 100.0)]);
        quotes(&mut state, "ETH", &[("B", 100.0)]);
        submit(&mut state, "m1", 5000.0, 0.01);
        submit(&mut state, "m2", 100.0, 100.0);

        let band = comparison.band_check(&state, 100).unwrap();
        assert_eq!(band.inside, 0);
        assert_eq!(band.total, 2);
        assert_eq!(
            band.to_string(),
            "Current priority order is within 1.00% of 0 of 2 miners (0.00%)"
        );
    }
}
