//! Scheduling loop
//!
//! Waits for ledger ticks and, on the trigger minute, collects quotes for the
//! block being built, pulls the records of the block that just closed, and
//! compares them against the quotes collected one tick earlier.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::compare::{BandReport, Comparison, ComparisonReport};
use crate::config::LedgerConfig;
use crate::ledger::{EntryParser, LedgerClient, LedgerError, TickMonitor, TimingInfo};
use crate::oracle::{self, SourceRegistry};
use crate::store::BlockStore;
use crate::types::{AssetBasket, Height};

/// Everything needed to compare a stored block; no network access
pub struct CompareContext {
    basket: AssetBasket,
    registry: Arc<SourceRegistry>,
    store: Arc<BlockStore>,
    tolerance_bps: u32,
}

impl CompareContext {
    pub fn new(registry: Arc<SourceRegistry>, store: Arc<BlockStore>, tolerance_bps: u32) -> Self {
        Self {
            basket: store.basket().clone(),
            registry,
            store,
            tolerance_bps,
        }
    }

    pub fn store(&self) -> &Arc<BlockStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    pub fn compare(&self, height: Height) -> Option<ComparisonReport> {
        let state = self.store.interval(height)?;
        Comparison::new(&self.registry, &self.basket).compare(&state)
    }

    pub fn band_check(&self, height: Height) -> Option<BandReport> {
        let state = self.store.interval(height)?;
        Comparison::new(&self.registry, &self.basket).band_check(&state, self.tolerance_bps)
    }

    /// Compare and band-check `height`, printing whatever was produced
    pub fn publish(&self, height: Height) -> (Option<ComparisonReport>, Option<BandReport>) {
        let Some(state) = self.store.interval(height) else {
            info!(height, "Nothing stored for height, skipping comparison");
            return (None, None);
        };

        let comparison = Comparison::new(&self.registry, &self.basket);
        let report = comparison.compare(&state);
        let band = comparison.band_check(&state, self.tolerance_bps);

        if let Some(report) = &report {
            println!("{}", report);
        }
        if let Some(band) = &band {
            println!("{}", band);
        }
        (report, band)
    }

    /// Compare every stored height that has both quotes and records, oldest
    /// first. Returns how many heights were reported.
    pub fn replay(&self) -> usize {
        let mut heights = self.store.block_list();
        heights.reverse();

        let mut reported = 0;
        for height in heights {
            let ready = self
                .store
                .interval(height)
                .is_some_and(|s| s.has_quotes() && s.has_submissions());
            if !ready {
                continue;
            }
            if self.publish(height).0.is_some() {
                reported += 1;
            }
        }
        info!(reported, "Replay finished");
        reported
    }
}

/// What one trigger-minute cycle did
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub height: Height,
    pub quotes: usize,
    pub submissions: usize,
    pub comparison: Option<ComparisonReport>,
    pub band: Option<BandReport>,
}

/// The live tool: tick monitor, quote polling, record ingestion and reporting
pub struct PriorityCompare {
    ctx: CompareContext,
    ledger: Arc<dyn LedgerClient>,
    poll_interval: Duration,
    trigger_minute: u8,
    min_version: u8,
    snapshot_path: Option<PathBuf>,
}

impl PriorityCompare {
    pub fn new(ctx: CompareContext, ledger: Arc<dyn LedgerClient>, config: &LedgerConfig) -> Self {
        Self {
            ctx,
            ledger,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            trigger_minute: config.trigger_minute,
            min_version: config.min_version,
            snapshot_path: None,
        }
    }

    /// Save the store to `path` after every tick
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn context(&self) -> &CompareContext {
        &self.ctx
    }

    /// Poll every source and store the quotes under `height`
    pub async fn collect_quotes(&self, height: Height) -> usize {
        let start = Instant::now();
        let quotes = oracle::collect_quotes(&self.ctx.registry).await;
        let count = quotes.len();
        self.ctx.store.record_quotes(height, quotes);
        info!(
            height,
            quotes = count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Quotes collected"
        );
        count
    }

    /// Download, validate and store the price records of block `height`
    pub async fn collect_submissions(&self, height: Height) -> Result<usize, LedgerError> {
        let start = Instant::now();
        info!(height, "Downloading entries");
        let entries = self.ledger.entries_for_height(height).await?;

        let parser = EntryParser::new(&self.ctx.basket, self.min_version);
        let submissions = parser.parse_all(&entries, height);
        let added = self.ctx.store.record_submissions(height, submissions);
        info!(
            height,
            entries = entries.len(),
            added,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Entries downloaded"
        );
        Ok(added)
    }

    /// One trigger-minute cycle while block `height` is being built
    pub async fn process_tick(&self, height: Height) -> TickReport {
        let mut tick = TickReport {
            height,
            ..Default::default()
        };
        tick.quotes = self.collect_quotes(height).await;

        if let Some(previous) = height.checked_sub(1) {
            match self.collect_submissions(previous).await {
                Ok(added) => tick.submissions = added,
                Err(e) => warn!(height = previous, error = %e, "Error downloading entries"),
            }
            let (comparison, band) = self.ctx.publish(previous);
            tick.comparison = comparison;
            tick.band = band;
        }

        self.save_snapshot();
        tick
    }

    fn save_snapshot(&self) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        if let Err(e) = self.ctx.store.snapshot().save(path) {
            warn!(path = %path.display(), error = %e, "Failed to save snapshot");
        }
    }

    /// Run until Ctrl-C. Fails only when the ledger cannot be reached at startup.
    pub async fn run(self) -> Result<()> {
        let initial = self
            .ledger
            .current_timing()
            .await
            .context("Failed to read the current minute from the ledger")?;
        info!(
            height = initial.height,
            minute = initial.minute,
            "Initializing at height {}",
            initial.height
        );

        let ticks = TickMonitor::new(self.ledger.clone(), self.poll_interval).spawn(initial);
        self.run_with(ticks).await;
        Ok(())
    }

    /// Drive cycles from `ticks` until the channel closes or Ctrl-C.
    /// Returns how many cycles ran.
    pub async fn run_with(&self, mut ticks: mpsc::Receiver<TimingInfo>) -> usize {
        let mut first_cycle = true;
        let mut cycles = 0;

        loop {
            let timing = tokio::select! {
                next = ticks.recv() => match next {
                    Some(timing) => timing,
                    None => {
                        warn!(cycles, "Tick stream closed");
                        return cycles;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown requested");
                    self.save_snapshot();
                    return cycles;
                }
            };

            if timing.minute != self.trigger_minute {
                info!(
                    height = timing.height,
                    minute = timing.minute,
                    "{} minute(s) until next comparison",
                    timing.minutes_until(self.trigger_minute)
                );
                continue;
            }

            if first_cycle {
                info!(
                    height = timing.height,
                    "First cycle: block {} has no quotes yet, its comparison will be skipped",
                    timing.height.saturating_sub(1)
                );
                first_cycle = false;
            }

            self.process_tick(timing.height).await;
            cycles += 1;
        }
    }
}
