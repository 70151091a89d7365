// src/engine/runtime.rs

use std::fmt;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::exec::CommandBackend;
use crate::types::RawEvent;

use super::pipeline::Pipeline;
use super::{Disposition, WatchSnapshot};

/// Consumer loop: feeds queued raw events through the [`Pipeline`] strictly
/// one at a time, in arrival order.
///
/// The loop ends once the queue is closed (the notification source was shut
/// down) and every event already queued has been handled.
pub struct Runtime<B: CommandBackend> {
    pipeline: Pipeline<B>,
    event_rx: mpsc::Receiver<RawEvent>,
    snapshot_tx: watch::Sender<WatchSnapshot>,
}

impl<B: CommandBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl<B: CommandBackend> Runtime<B> {
    pub fn new(
        pipeline: Pipeline<B>,
        event_rx: mpsc::Receiver<RawEvent>,
        snapshot_tx: watch::Sender<WatchSnapshot>,
    ) -> Self {
        Self {
            pipeline,
            event_rx,
            snapshot_tx,
        }
    }

    /// Main event loop. Returns the pipeline once the queue is drained.
    pub async fn run(mut self) -> Pipeline<B> {
        info!("watchf consumer started");
        let mut generation = self.pipeline.watch_set().generation();

        while let Some(event) = self.event_rx.recv().await {
            let disposition = self.pipeline.handle(event).await;
            if let Disposition::Executed(report) = &disposition {
                debug!(
                    executed = report.executed.len(),
                    failed = report.failed.len(),
                    skipped = report.skipped,
                    "command sequence finished"
                );
            }

            let current = self.pipeline.watch_set().generation();
            if current != generation {
                generation = current;
                self.snapshot_tx.send_replace(self.pipeline.snapshot());
            } else {
                let pipeline = &self.pipeline;
                self.snapshot_tx.send_modify(|snap| {
                    let fresh = pipeline.snapshot_counts();
                    snap.fingerprints = fresh.fingerprints;
                    snap.events_seen = fresh.events_seen;
                    snap.executions = fresh.executions;
                });
            }
        }

        info!("event queue closed; consumer exiting");
        self.pipeline
    }
}
