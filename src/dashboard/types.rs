//! Dashboard API Types
//!
//! DTOs served by the block browser.

use serde::{Deserialize, Serialize};

use crate::types::{Asset, Height};

/// Envelope for every JSON response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// One named value in a detail table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
}

/// Quotes and miner values for one asset at one height
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDetailResponse {
    pub height: Height,
    pub asset: Asset,
    /// Sorted by source name
    pub sources: Vec<NamedValue>,
    /// Sorted by labelled miner id
    pub miners: Vec<NamedValue>,
}

impl AssetDetailResponse {
    /// Plain-text rendering used by the raw endpoint
    pub fn to_table(&self) -> String {
        let mut out = format!("Height {} {}\n", self.height, self.asset);
        for (title, rows) in [("Sources", &self.sources), ("Miners", &self.miners)] {
            out.push_str(title);
            out.push('\n');
            for row in rows {
                out.push_str(&format!("  {:<32} {:>20.8}\n", row.name, row.value));
            }
        }
        out
    }
}
