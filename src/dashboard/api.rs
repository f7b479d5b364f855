//! Dashboard HTTP API
//!
//! Read-only REST endpoints over the block store.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::types::*;
use crate::store::{BlockInfo, BlockStore};
use crate::types::{Asset, Height};

/// Create the API router with all endpoints
pub fn create_router(store: Arc<BlockStore>) -> Router {
    Router::new()
        .route("/api/blocks", get(get_blocks))
        .route("/api/blocks/:height", get(get_block))
        .route("/api/blocks/:height/:asset", get(get_asset))
        .route("/raw/:height/:asset", get(get_raw_asset))
        .with_state(store)
        // CORS for frontend
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

fn not_found(msg: String) -> Response {
    (StatusCode::NOT_FOUND, Json(ApiResponse::<()>::error(msg))).into_response()
}

fn asset_detail(
    store: &BlockStore,
    height: Height,
    asset: &str,
) -> Result<AssetDetailResponse, String> {
    let info = store
        .block_info(height)
        .ok_or_else(|| format!("unknown height {}", height))?;
    let asset = Asset::new(asset);
    let view = info
        .assets
        .get(&asset)
        .ok_or_else(|| format!("unknown asset {} at height {}", asset, height))?;

    let rows = |m: &std::collections::BTreeMap<String, f64>| -> Vec<NamedValue> {
        m.iter()
            .map(|(name, value)| NamedValue {
                name: name.clone(),
                value: *value,
            })
            .collect()
    };

    Ok(AssetDetailResponse {
        height,
        sources: rows(&view.sources),
        miners: rows(&view.miners),
        asset,
    })
}

// ─────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────

/// GET /api/blocks - Known heights, most recent first
async fn get_blocks(State(store): State<Arc<BlockStore>>) -> Json<ApiResponse<Vec<Height>>> {
    Json(ApiResponse::success(store.block_list()))
}

/// GET /api/blocks/:height - Summary of one block
async fn get_block(State(store): State<Arc<BlockStore>>, Path(height): Path<Height>) -> Response {
    match store.block_info(height) {
        Some(info) => Json(ApiResponse::<BlockInfo>::success(info)).into_response(),
        None => not_found(format!("unknown height {}", height)),
    }
}

/// GET /api/blocks/:height/:asset - Quotes and miner values for one asset
async fn get_asset(
    State(store): State<Arc<BlockStore>>,
    Path((height, asset)): Path<(Height, String)>,
) -> Response {
    match asset_detail(&store, height, &asset) {
        Ok(detail) => Json(ApiResponse::success(detail)).into_response(),
        Err(msg) => not_found(msg),
    }
}

/// GET /raw/:height/:asset - Same as above, as a plain-text table
async fn get_raw_asset(
    State(store): State<Arc<BlockStore>>,
    Path((height, asset)): Path<(Height, String)>,
) -> Response {
    match asset_detail(&store, height, &asset) {
        Ok(detail) => detail.to_table().into_response(),
        Err(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
    }
}
