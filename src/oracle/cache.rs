//! Per-tick quote cache
//!
//! Wraps every provider for the duration of one tick so that each
//! (source, asset) pair hits the network at most once, even when requested
//! concurrently. Quotes leave the cache already in fixed-point form.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::sources::{QuoteProvider, SourceError};
use crate::types::{Asset, FixedPrice};

type Slot = Arc<OnceCell<Result<FixedPrice, SourceError>>>;

pub struct QuoteCache {
    providers: HashMap<String, Arc<dyn QuoteProvider>>,
    slots: Mutex<HashMap<(String, Asset), Slot>>,
}

impl QuoteCache {
    pub fn new<'a>(providers: impl IntoIterator<Item = &'a Arc<dyn QuoteProvider>>) -> Self {
        Self {
            providers: providers
                .into_iter()
                .map(|p| (p.name().to_string(), p.clone()))
                .collect(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Quote for `asset` from `source`, fetched on first request only
    pub async fn fetch(&self, source: &str, asset: &Asset) -> Result<FixedPrice, SourceError> {
        let provider = self
            .providers
            .get(source)
            .cloned()
            .ok_or_else(|| SourceError::Unsupported {
                provider: source.to_string(),
                asset: asset.clone(),
            })?;

        let slot = {
            let mut slots = self.slots.lock();
            slots
                .entry((source.to_string(), asset.clone()))
                .or_default()
                .clone()
        };

        slot.get_or_init(|| async move {
            let value = provider.fetch_quote(asset).await?;
            FixedPrice::from_f64(value).ok_or(SourceError::InvalidPrice(value))
        })
        .await
        .clone()
    }

    /// Number of distinct (source, asset) pairs requested so far
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
