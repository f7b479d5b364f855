use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use priority_compare::config::AppConfig;
use priority_compare::ledger::FactomdClient;
use priority_compare::oracle::SourceRegistry;
use priority_compare::runner::{CompareContext, PriorityCompare};
use priority_compare::store::{BlockStore, Snapshot};

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(feature = "dashboard")]
fn spawn_dashboard(config: &AppConfig, store: &Arc<BlockStore>) -> bool {
    if !config.dashboard.enabled {
        return false;
    }
    let store = store.clone();
    let port = config.dashboard.port;
    tokio::spawn(async move {
        if let Err(e) = priority_compare::dashboard::start_server(store, port).await {
            tracing::error!(error = %e, "Dashboard server stopped");
        }
    });
    true
}

#[cfg(not(feature = "dashboard"))]
fn spawn_dashboard(config: &AppConfig, _store: &Arc<BlockStore>) -> bool {
    if config.dashboard.enabled {
        tracing::warn!(
            "dashboard.enabled is set but the binary was built without the dashboard feature"
        );
    }
    false
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(config.logging.json);
    info!("Starting priority-compare: {}", config);

    let registry = Arc::new(SourceRegistry::from_config(&config)?);
    info!(
        "{} data sources loaded: {}",
        registry.priority_list().len(),
        registry.describe()
    );

    let store = Arc::new(BlockStore::new(config.basket()));
    let serving = spawn_dashboard(&config, &store);
    let ctx = CompareContext::new(registry, store.clone(), config.band.tolerance_bps);

    if let Some(path) = &config.snapshot.replay_path {
        let snapshot =
            Snapshot::load(path).with_context(|| format!("Failed to load replay {}", path))?;
        info!(path = %path, blocks = snapshot.blocks.len(), "Replaying snapshot");
        store.restore(snapshot);
        ctx.replay();

        if serving {
            info!("Replay done, serving dashboard until Ctrl-C");
            tokio::signal::ctrl_c().await?;
        }
        return Ok(());
    }

    let ledger = Arc::new(FactomdClient::new(&config.ledger)?);
    let mut runner = PriorityCompare::new(ctx, ledger, &config.ledger);
    if let Some(path) = &config.snapshot.save_path {
        runner = runner.with_snapshot_path(path);
    }
    runner.run().await
}
