//! Tick monitor
//!
//! Polls the ledger for the current minute and emits an event every time the
//! (height, minute) pair moves.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::{LedgerClient, TimingInfo};

const EVENT_BUFFER: usize = 16;

pub struct TickMonitor {
    ledger: Arc<dyn LedgerClient>,
    poll_interval: Duration,
}

impl TickMonitor {
    pub fn new(ledger: Arc<dyn LedgerClient>, poll_interval: Duration) -> Self {
        Self {
            ledger,
            poll_interval,
        }
    }

    /// Start polling in the background.
    ///
    /// `initial` is the timing observed at startup; it is never re-emitted,
    /// so the minute the process started in is not treated as a fresh tick.
    /// The task stops once the receiver is dropped.
    pub fn spawn(self, initial: TimingInfo) -> mpsc::Receiver<TimingInfo> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        tokio::spawn(async move {
            let mut last = initial;
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match self.ledger.current_timing().await {
                    Ok(timing) if timing != last => {
                        last = timing;
                        if tx.send(timing).await.is_err() {
                            tracing::debug!("Tick listener dropped, stopping monitor");
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "Failed to poll ledger timing"),
                }
            }
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerError, MockLedgerClient};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn emits_only_on_change() {
        let script = [
            (10, 0),
            (10, 0),
            (10, 1),
            (10, 1),
            (10, 2),
            (11, 0),
        ];
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut ledger = MockLedgerClient::new();
        ledger.expect_current_timing().returning(move || {
            let i = counter.fetch_add(1, Ordering::SeqCst).min(script.len() - 1);
            let (height, minute) = script[i];
            Ok(TimingInfo { height, minute })
        });

        let monitor = TickMonitor::new(Arc::new(ledger), Duration::from_millis(1));
        let mut rx = monitor.spawn(TimingInfo {
            height: 10,
            minute: 0,
        });

        let mut seen = Vec::new();
        for _ in 0..3 {
            let t = rx.recv().await.unwrap();
            seen.push((t.height, t.minute));
        }
        assert_eq!(seen, vec![(10, 1), (10, 2), (11, 0)]);
    }

    #[tokio::test]
    async fn survives_poll_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut ledger = MockLedgerClient::new();
        ledger.expect_current_timing().returning(move || {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(LedgerError::EmptyResult("current-minute".to_string()))
            } else {
                Ok(TimingInfo {
                    height: 3,
                    minute: 1,
                })
            }
        });

        let monitor = TickMonitor::new(Arc::new(ledger), Duration::from_millis(1));
        let mut rx = monitor.spawn(TimingInfo {
            height: 3,
            minute: 0,
        });

        let t = rx.recv().await.unwrap();
        assert_eq!(t.minute, 1);
        assert!(calls.load(Ordering::SeqCst) >= 3);
    }
}
