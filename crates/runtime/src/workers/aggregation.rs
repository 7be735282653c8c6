//! Usage counter aggregation worker.
//!
//! Concluded battles hand their counter increments to an
//! [`AggregationHandle`]; the worker applies them to a [`UsageRepository`]
//! in arrival order. Writes are fire-and-forget: a full queue drops the batch
//! with a warning instead of stalling the battle path.

use std::sync::Arc;

use combat_core::UsageRecord;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::{Result, RuntimeError};
use crate::repository::UsageRepository;

/// Commands accepted by the aggregation worker
pub enum Command {
    /// Add counter increments
    Record(Vec<UsageRecord>),

    /// Reply once every earlier command has been applied
    Flush { reply: oneshot::Sender<()> },

    /// Shutdown the worker gracefully
    Shutdown,
}

/// Background worker that owns the usage repository writes
pub struct AggregationWorker {
    repository: Arc<dyn UsageRepository>,
    command_rx: mpsc::Receiver<Command>,
    applied: u64,
}

impl AggregationWorker {
    pub fn new(repository: Arc<dyn UsageRepository>, command_rx: mpsc::Receiver<Command>) -> Self {
        Self {
            repository,
            command_rx,
            applied: 0,
        }
    }

    /// Spawns the worker and returns its handle.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        repository: Arc<dyn UsageRepository>,
        buffer: usize,
    ) -> (AggregationHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(buffer.max(1));
        let task = tokio::spawn(Self::new(repository, command_rx).run());
        (AggregationHandle { command_tx }, task)
    }

    /// Main worker loop
    pub async fn run(mut self) {
        info!("AggregationWorker started");

        while let Some(command) = self.command_rx.recv().await {
            match command {
                Command::Record(records) => self.apply(&records),
                Command::Flush { reply } => {
                    let _ = reply.send(());
                }
                Command::Shutdown => {
                    info!("Shutdown command received");
                    break;
                }
            }
        }

        info!("AggregationWorker stopped after {} counter rows", self.applied);
    }

    fn apply(&mut self, records: &[UsageRecord]) {
        match self.repository.record(records) {
            Ok(()) => {
                self.applied += records.len() as u64;
                debug!("Applied {} usage counter rows", records.len());
            }
            Err(e) => error!("Failed to record usage counters: {}", e),
        }
    }
}

/// Cloneable sender side of the aggregation worker.
#[derive(Clone)]
pub struct AggregationHandle {
    command_tx: mpsc::Sender<Command>,
}

impl AggregationHandle {
    /// Queues increments without waiting. Never fails the caller.
    pub fn record(&self, records: Vec<UsageRecord>) {
        if records.is_empty() {
            return;
        }
        match self.command_tx.try_send(Command::Record(records)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(Command::Record(dropped))) => {
                warn!("Aggregation queue full, dropping {} counter rows", dropped.len());
            }
            Err(mpsc::error::TrySendError::Full(_)) => {}
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Aggregation worker stopped, counters not recorded");
            }
        }
    }

    /// Waits until everything queued before this call has been applied.
    pub async fn flush(&self) -> Result<()> {
        let (reply, done) = oneshot::channel();
        self.command_tx
            .send(Command::Flush { reply })
            .await
            .map_err(|_| RuntimeError::AggregationClosed)?;
        done.await.map_err(|_| RuntimeError::AggregationClosed)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.command_tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| RuntimeError::AggregationClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryUsageStore;
    use combat_core::{BattleOutcome, BattleType, ContentType, UsageKey};

    fn win(id: &str) -> UsageRecord {
        UsageRecord {
            key: UsageKey {
                content_type: ContentType::Item,
                content_id: id.to_string(),
                battle_type: BattleType::Arena,
                outcome: BattleOutcome::Win,
            },
            count: 1,
        }
    }

    #[tokio::test]
    async fn flush_waits_for_queued_records() {
        let store = Arc::new(InMemoryUsageStore::new());
        let (handle, task) = AggregationWorker::spawn(store.clone(), 8);

        handle.record(vec![win("kunai")]);
        handle.record(vec![win("kunai"), win("soldier_pill")]);
        handle.flush().await.expect("flush");

        let counters = store.counters().expect("counters");
        assert_eq!(counters.len(), 2);
        assert!(counters.iter().any(|r| r.key.content_id == "kunai" && r.count == 2));

        handle.shutdown().await.expect("shutdown");
        task.await.expect("join");
        assert!(matches!(
            handle.flush().await,
            Err(RuntimeError::AggregationClosed)
        ));
    }
}
