//! priority-compare library
//!
//! Ranks price data sources by how closely they track the values miners
//! publish in their oracle price records.

pub mod compare;
pub mod config;
pub mod ledger;
pub mod oracle;
pub mod runner;
pub mod store;
pub mod types;

#[cfg(feature = "dashboard")]
pub mod dashboard;

#[cfg(test)]
mod test_support;
