//! factomd JSON-RPC client
//!
//! Talks to the v2 API for timing information and to pull the oracle chain's
//! entries out of a directory block.

use anyhow::Context;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::{LedgerClient, LedgerError, RawEntry, TimingInfo};
use crate::config::LedgerConfig;
use crate::types::Height;

/// Concurrent `entry` requests per block
const ENTRY_FETCH_CONCURRENCY: usize = 16;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct CurrentMinute {
    directoryblockheight: u64,
    minute: u8,
}

#[derive(Debug, Deserialize)]
struct DBlockResult {
    dblock: DBlock,
}

#[derive(Debug, Deserialize)]
struct DBlock {
    dbentries: Vec<DBEntry>,
}

#[derive(Debug, Deserialize)]
struct DBEntry {
    chainid: String,
    keymr: String,
}

#[derive(Debug, Deserialize)]
struct EntryBlock {
    entrylist: Vec<EntryRef>,
}

#[derive(Debug, Deserialize)]
struct EntryRef {
    entryhash: String,
}

#[derive(Debug, Deserialize)]
struct EntryResult {
    #[serde(default)]
    extids: Vec<String>,
    #[serde(default)]
    content: String,
}

#[derive(Debug)]
pub struct FactomdClient {
    client: reqwest::Client,
    endpoint: String,
    chain_id: String,
    next_id: AtomicU64,
}

impl FactomdClient {
    pub fn new(config: &LedgerConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/v2", config.factomd_url.trim_end_matches('/')),
            chain_id: config.chain_id.clone(),
            next_id: AtomicU64::new(0),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, LedgerError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response: RpcResponse<T> = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(LedgerError::Rpc {
                method: method.to_string(),
                code: err.code,
                message: err.message,
            });
        }
        response
            .result
            .ok_or_else(|| LedgerError::EmptyResult(method.to_string()))
    }

    async fn entry(&self, hash: String) -> Result<RawEntry, LedgerError> {
        let result: EntryResult = self.call("entry", json!({ "hash": hash })).await?;
        let ext_ids = result
            .extids
            .iter()
            .map(hex::decode)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RawEntry {
            ext_ids,
            content: hex::decode(&result.content)?,
        })
    }
}

#[async_trait]
impl LedgerClient for FactomdClient {
    async fn current_timing(&self) -> Result<TimingInfo, LedgerError> {
        let minute: CurrentMinute = self.call("current-minute", json!({})).await?;
        // directoryblockheight is the last completed block
        Ok(TimingInfo {
            height: minute.directoryblockheight as Height + 1,
            minute: minute.minute,
        })
    }

    async fn entries_for_height(&self, height: Height) -> Result<Vec<RawEntry>, LedgerError> {
        let result: DBlockResult = self
            .call("dblock-by-height", json!({ "height": height }))
            .await?;

        let keymr = result
            .dblock
            .dbentries
            .into_iter()
            .find(|e| e.chainid == self.chain_id)
            .map(|e| e.keymr)
            .ok_or(LedgerError::ChainNotFound(height))?;

        let eblock: EntryBlock = self.call("entry-block", json!({ "keymr": keymr })).await?;

        tracing::debug!(
            height,
            entries = eblock.entrylist.len(),
            "Fetching oracle entries"
        );

        stream::iter(eblock.entrylist.into_iter().map(|e| self.entry(e.entryhash)))
            .buffered(ENTRY_FETCH_CONCURRENCY)
            .try_collect()
            .await
    }
}
