//! Fixed unit-of-account source
//!
//! The reference asset is priced in itself, so its quote is always 1.0.

use async_trait::async_trait;

use super::{QuoteProvider, SourceError};
use crate::types::Asset;

pub const FIXED_USD: &str = "FixedUSD";

#[derive(Debug, Clone)]
pub struct FixedUsd {
    asset: Asset,
}

impl FixedUsd {
    pub fn new(reference: Asset) -> Self {
        Self { asset: reference }
    }
}

#[async_trait]
impl QuoteProvider for FixedUsd {
    fn name(&self) -> &str {
        FIXED_USD
    }

    fn supports(&self, asset: &Asset) -> bool {
        *asset == self.asset
    }

    async fn fetch_quote(&self, asset: &Asset) -> Result<f64, SourceError> {
        if !self.supports(asset) {
            return Err(SourceError::Unsupported {
                provider: FIXED_USD.to_string(),
                asset: asset.clone(),
            });
        }
        Ok(1.0)
    }
}
