//! Shared fixtures for unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ledger::{RawEntry, RecordContent};
use crate::oracle::{QuoteProvider, SourceError};
use crate::types::{Asset, AssetBasket, FixedPrice, Height};

/// USD (reference), BTC, ETH
pub(crate) fn basket() -> AssetBasket {
    AssetBasket::new(
        vec![Asset::new("USD"), Asset::new("BTC"), Asset::new("ETH")],
        Asset::new("USD"),
    )
}

/// A well-formed price record entry with values in basket order
pub(crate) fn record(id: &str, height: Height, assets: &[f64]) -> RawEntry {
    let content = RecordContent {
        address: format!("FA-{id}"),
        id: id.to_string(),
        height,
        assets: assets
            .iter()
            .map(|v| FixedPrice::from_f64(*v).unwrap().raw())
            .collect(),
        winners: Vec::new(),
    };
    RawEntry {
        ext_ids: vec![b"nonce".to_vec(), vec![0u8; 8], vec![4]],
        content: serde_json::to_vec(&content).unwrap(),
    }
}

/// In-memory provider with canned quotes and a call counter
pub(crate) struct StubSource {
    name: String,
    supported: Vec<Asset>,
    quotes: HashMap<Asset, f64>,
    calls: AtomicUsize,
}

impl StubSource {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            supported: Vec::new(),
            quotes: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn supporting(mut self, assets: &[&str]) -> Self {
        self.supported.extend(assets.iter().map(Asset::new));
        self
    }

    pub(crate) fn with_quote(mut self, asset: &str, value: f64) -> Self {
        self.quotes.insert(Asset::new(asset), value);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for StubSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, asset: &Asset) -> bool {
        self.supported.contains(asset) || self.quotes.contains_key(asset)
    }

    async fn fetch_quote(&self, asset: &Asset) -> Result<f64, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.quotes
            .get(asset)
            .copied()
            .ok_or_else(|| SourceError::Http(format!("{} is down", self.name)))
    }
}
