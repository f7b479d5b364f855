//! Dashboard Module
//!
//! Read-only HTTP block browser over the store.
//! Only compiled when the `dashboard` feature is enabled.

mod api;
mod types;

pub use api::create_router;
pub use types::*;

use std::sync::Arc;

use crate::store::BlockStore;

/// Start the dashboard server
pub async fn start_server(store: Arc<BlockStore>, port: u16) -> anyhow::Result<()> {
    let app = create_router(store);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("Dashboard API starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
