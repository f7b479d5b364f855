//! Core types used throughout priority-compare
//!
//! Assets, ledger heights and the fixed-point price representation that every
//! diff, tie and band computation goes through.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Ledger (directory block) height
pub type Height = u32;

/// A tracked asset ticker (e.g. "BTC", "XAU")
///
/// Tickers are normalized to upper case on construction so that config,
/// provider and submission spellings all compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asset(String);

impl Asset {
    pub fn new(ticker: impl AsRef<str>) -> Self {
        Asset(ticker.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Asset {
    fn from(s: &str) -> Self {
        Asset::new(s)
    }
}

impl Borrow<str> for Asset {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The configured asset list in record order, plus the unit-of-account asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBasket {
    tracked: Vec<Asset>,
    reference: Asset,
}

impl AssetBasket {
    pub fn new(tracked: Vec<Asset>, reference: Asset) -> Self {
        Self { tracked, reference }
    }

    /// Every tracked asset, in the order miners submit them
    pub fn tracked(&self) -> &[Asset] {
        &self.tracked
    }

    pub fn reference(&self) -> &Asset {
        &self.reference
    }

    pub fn is_reference(&self, asset: &Asset) -> bool {
        *asset == self.reference
    }

    /// Tracked assets that take part in comparisons (everything but the reference)
    pub fn compared(&self) -> impl Iterator<Item = &Asset> + '_ {
        self.tracked.iter().filter(move |a| !self.is_reference(a))
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }
}

/// Exact price representation: unsigned integer with eight implied decimals.
///
/// Quotes arrive as floats and are converted once at the boundary; after that
/// all comparisons are integer comparisons, so the same candidate wins on
/// every platform.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FixedPrice(u64);

impl FixedPrice {
    /// Number of raw units per 1.0
    pub const SCALE: u64 = 100_000_000;
    pub const DECIMALS: u32 = 8;

    pub const fn from_raw(raw: u64) -> Self {
        FixedPrice(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Convert a float quote, rounding half away from zero at the eighth decimal.
    ///
    /// Returns `None` for NaN, infinities, negative values and values too
    /// large for the representation.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let scaled = Decimal::from_f64(value)?.checked_mul(dec!(100000000))?;
        scaled
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u64()
            .map(FixedPrice)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::from_i128_with_scale(self.0 as i128, Self::DECIMALS)
    }

    /// Absolute distance in raw units
    pub fn abs_diff(self, other: FixedPrice) -> u64 {
        self.0.abs_diff(other.0)
    }

    /// True iff `self` lies within `bps` basis points of `reference`, bounds inclusive.
    pub fn within_bps(self, reference: FixedPrice, bps: u32) -> bool {
        let diff = self.abs_diff(reference) as u128;
        diff * 10_000 <= reference.0 as u128 * bps as u128
    }
}

impl fmt::Display for FixedPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

/// One quote from one source for one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub asset: Asset,
    pub source: String,
    pub value: FixedPrice,
}
