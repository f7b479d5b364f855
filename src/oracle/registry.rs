//! Data source registry
//!
//! Holds the enabled providers in priority order and, for every tracked
//! asset, the ordered list of sources eligible to quote it.

use anyhow::{bail, Result};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use super::cache::QuoteCache;
use super::sources::{
    BinanceSource, CoinGeckoSource, CoinbaseSource, FixedUsd, QuoteProvider, FIXED_USD,
};
use crate::config::AppConfig;
use crate::types::{Asset, AssetBasket};

/// A configured provider and its priority (0 = highest)
#[derive(Clone)]
pub struct DataSource {
    pub priority: usize,
    pub provider: Arc<dyn QuoteProvider>,
}

impl DataSource {
    pub fn name(&self) -> &str {
        self.provider.name()
    }
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.priority)
    }
}

#[derive(Debug, Clone)]
pub struct SourceRegistry {
    /// Priority order
    sources: Vec<DataSource>,
    asset_sources: BTreeMap<Asset, Vec<String>>,
    reference: String,
}

impl SourceRegistry {
    /// Build from providers already in priority order.
    ///
    /// Fails when names collide, the reference source is missing, or a
    /// tracked asset has no eligible source.
    pub fn new(
        providers: Vec<Arc<dyn QuoteProvider>>,
        basket: &AssetBasket,
        reference: &str,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for p in &providers {
            if !seen.insert(p.name().to_string()) {
                bail!("data source {} configured twice", p.name());
            }
        }
        if !seen.contains(reference) {
            bail!("reference source {} is not enabled", reference);
        }

        let sources: Vec<DataSource> = providers
            .into_iter()
            .enumerate()
            .map(|(priority, provider)| DataSource { priority, provider })
            .collect();

        let mut asset_sources = BTreeMap::new();
        for asset in basket.tracked() {
            let eligible: Vec<String> = sources
                .iter()
                .filter(|s| s.provider.supports(asset))
                .map(|s| s.name().to_string())
                .collect();
            if eligible.is_empty() {
                bail!("no enabled data source can quote {}", asset);
            }
            asset_sources.insert(asset.clone(), eligible);
        }

        Ok(Self {
            sources,
            asset_sources,
            reference: reference.to_string(),
        })
    }

    /// Instantiate the providers named in `sources.order`
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let basket = config.basket();
        let timeout = Duration::from_millis(config.sources.request_timeout_ms);

        let mut providers: Vec<Arc<dyn QuoteProvider>> = Vec::new();
        for name in &config.sources.order {
            let provider: Arc<dyn QuoteProvider> = match name.as_str() {
                FIXED_USD => Arc::new(FixedUsd::new(basket.reference().clone())),
                "Coinbase" => Arc::new(CoinbaseSource::new(timeout)?),
                "Binance" => Arc::new(BinanceSource::new(timeout)?),
                "CoinGecko" => Arc::new(CoinGeckoSource::new(timeout)?),
                other => bail!("unknown data source {}", other),
            };
            providers.push(provider);
        }

        Self::new(providers, &basket, &config.sources.reference)
    }

    /// Every enabled source, highest priority first
    pub fn priority_list(&self) -> &[DataSource] {
        &self.sources
    }

    pub fn names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    /// Sources eligible for `asset`, highest priority first
    pub fn sources_for(&self, asset: &Asset) -> &[String] {
        self.asset_sources
            .get(asset)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The source whose quote the band check trusts for `asset`
    pub fn top_source(&self, asset: &Asset) -> Option<&str> {
        self.sources_for(asset).first().map(String::as_str)
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Every (source, asset) pair to poll on a tick
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &Asset)> + '_ {
        self.asset_sources
            .iter()
            .flat_map(|(asset, sources)| sources.iter().map(move |s| (s.as_str(), asset)))
    }

    /// Fresh cache over every provider, valid for one tick
    pub fn cache(&self) -> QuoteCache {
        QuoteCache::new(self.sources.iter().map(|s| &s.provider))
    }

    /// "FixedUSD (0), Coinbase (1), ..."
    pub fn describe(&self) -> String {
        self.sources
            .iter()
            .map(|s| format!("{:?}", s))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
