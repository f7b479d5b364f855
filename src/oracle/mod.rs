//! Oracle module - price quote providers
//!
//! Polls every enabled data source for every asset it can quote, once per
//! tick, through a memoizing cache.

mod cache;
mod registry;
pub mod sources;

pub use cache::QuoteCache;
pub use registry::{DataSource, SourceRegistry};
pub use sources::{QuoteProvider, SourceError};

use futures_util::future::join_all;

use crate::types::PriceQuote;

/// Fetch every eligible (source, asset) pair concurrently.
///
/// Failures are logged per pair and simply left out of the result.
pub async fn collect_quotes(registry: &SourceRegistry) -> Vec<PriceQuote> {
    let cache = registry.cache();

    let requests = registry.pairs().map(|(source, asset)| {
        let cache = &cache;
        async move {
            match cache.fetch(source, asset).await {
                Ok(value) => Some(PriceQuote {
                    asset: asset.clone(),
                    source: source.to_string(),
                    value,
                }),
                Err(e) => {
                    tracing::warn!(
                        source = %source,
                        asset = %asset,
                        error = %e,
                        "Quote fetch failed"
                    );
                    None
                }
            }
        }
    });

    join_all(requests).await.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::sources::FixedUsd;
    use crate::test_support::{basket, StubSource};
    use crate::types::{Asset, FixedPrice};
    use std::sync::Arc;

    #[tokio::test]
    async fn collects_successful_pairs_only() {
        let providers: Vec<Arc<dyn QuoteProvider>> = vec![
            Arc::new(FixedUsd::new(Asset::new("USD"))),
            Arc::new(
                StubSource::new("A")
                    .supporting(&["BTC", "ETH"])
                    .with_quote("BTC", 100.0)
                    .with_quote("ETH", 10.0),
            ),
            Arc::new(
                StubSource::new("B")
                    .supporting(&["BTC", "ETH"])
                    .with_quote("BTC", 101.0),
            ),
        ];
        let registry = SourceRegistry::new(providers, &basket(), "FixedUSD").unwrap();

        let mut quotes = collect_quotes(&registry).await;
        quotes.sort_by(|a, b| (&a.asset, &a.source).cmp(&(&b.asset, &b.source)));

        let summary: Vec<(&str, &str, FixedPrice)> = quotes
            .iter()
            .map(|q| (q.asset.as_str(), q.source.as_str(), q.value))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("BTC", "A", FixedPrice::from_raw(10_000_000_000)),
                ("BTC", "B", FixedPrice::from_raw(10_100_000_000)),
                ("ETH", "A", FixedPrice::from_raw(1_000_000_000)),
                ("USD", "FixedUSD", FixedPrice::from_raw(100_000_000)),
            ]
        );
    }
}
