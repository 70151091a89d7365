// src/service.rs

//! The watch service: notification source, bootstrap and consumer task.
//!
//! `start` must be called from inside a tokio runtime: the consumer runs as a
//! tokio task and the notify callback feeds it through a bounded queue.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::daemon::Service;
use crate::engine::{Pipeline, Runtime, WatchSnapshot};
use crate::errors::{Result, WatchfError};
use crate::exec::{CommandBackend, RealCommandBackend};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::RawEvent;
use crate::watch::{NotifySource, StabilizeSettings, EVENT_QUEUE_CAPACITY};

struct Running {
    root: PathBuf,
    source: NotifySource,
    consumer: JoinHandle<()>,
    snapshot: watch::Receiver<WatchSnapshot>,
}

/// Watches one root directory and runs the configured commands on changes.
pub struct WatchService<B: CommandBackend + Clone + 'static = RealCommandBackend> {
    root: PathBuf,
    config: Config,
    fs: Arc<dyn FileSystem>,
    backend: B,
    stabilize: StabilizeSettings,
    running: Option<Running>,
}

impl<B: CommandBackend + Clone + 'static> fmt::Debug for WatchService<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchService")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("running", &self.running.is_some())
            .finish_non_exhaustive()
    }
}

impl WatchService<RealCommandBackend> {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        Self::with_backend(
            root,
            config,
            Arc::new(RealFileSystem),
            RealCommandBackend::new(),
        )
    }
}

impl<B: CommandBackend + Clone + 'static> WatchService<B> {
    pub fn with_backend(
        root: impl Into<PathBuf>,
        config: Config,
        fs: Arc<dyn FileSystem>,
        backend: B,
    ) -> Self {
        let stabilize = StabilizeSettings::with_max_wait(config.stabilize_timeout());
        Self {
            root: root.into(),
            config,
            fs,
            backend,
            stabilize,
            running: None,
        }
    }

    /// Override the size-settling parameters used for modify events.
    pub fn with_stabilize_settings(mut self, settings: StabilizeSettings) -> Self {
        self.stabilize = settings;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Canonical root, once started.
    pub fn root(&self) -> Option<&Path> {
        self.running.as_ref().map(|r| r.root.as_path())
    }

    /// True between a successful `start` and the end of the drain.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.consumer.is_finished())
    }

    /// Latest state published by the consumer.
    pub fn snapshot(&self) -> Option<WatchSnapshot> {
        self.running.as_ref().map(|r| r.snapshot.borrow().clone())
    }

    /// Receiver that is notified whenever the consumer publishes a snapshot.
    pub fn subscribe(&self) -> Option<watch::Receiver<WatchSnapshot>> {
        self.running.as_ref().map(|r| r.snapshot.clone())
    }

    /// Start watching.
    ///
    /// On error nothing is left running: the notification source is closed
    /// and no consumer is spawned.
    pub fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            return Err(WatchfError::AlreadyRunning(format!(
                "watch service for {:?}",
                self.root
            )));
        }

        let handle = Handle::try_current()
            .map_err(|_| anyhow!("the watch service must be started inside a tokio runtime"))?;

        let root = self
            .fs
            .canonicalize(&self.root)
            .map_err(|err| WatchfError::InvalidRoot {
                path: self.root.clone(),
                reason: format!("{err:#}"),
            })?;
        if !self.fs.is_dir(&root).unwrap_or(false) {
            return Err(WatchfError::InvalidRoot {
                path: root,
                reason: "not a directory".to_string(),
            });
        }

        let (event_tx, event_rx) = mpsc::channel::<RawEvent>(EVENT_QUEUE_CAPACITY);
        let source = NotifySource::spawn(event_tx)?;

        let mut pipeline = Pipeline::new(
            &self.config,
            Arc::clone(&self.fs),
            Box::new(source.clone()),
            self.backend.clone(),
        )
        .with_stabilize_settings(self.stabilize);

        if let Err(err) = pipeline.bootstrap(&root) {
            let _ = source.close();
            return Err(err);
        }

        let (snapshot_tx, snapshot_rx) = watch::channel(pipeline.snapshot());
        let runtime = Runtime::new(pipeline, event_rx, snapshot_tx);
        let consumer = handle.spawn(async move {
            runtime.run().await;
        });

        info!(?root, recursive = self.config.recursive(), "watch service started");
        self.running = Some(Running {
            root,
            source,
            consumer,
            snapshot: snapshot_rx,
        });
        Ok(())
    }

    /// Close the notification source. Events already queued are still
    /// handled; use [`wait`](Self::wait) to block until they are.
    pub fn stop(&mut self) -> Result<()> {
        let running = self
            .running
            .as_ref()
            .ok_or_else(|| WatchfError::NotRunning("watch service".to_string()))?;

        if !running.source.close()? {
            return Err(WatchfError::NotRunning("watch service".to_string()));
        }
        info!(root = ?running.root, "watch service stopping; draining queued events");
        Ok(())
    }

    /// Wait for the consumer to finish draining. Blocks until [`stop`] has
    /// been called; returns immediately if the service was never started.
    ///
    /// [`stop`]: Self::stop
    pub async fn wait(&mut self) -> Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        running
            .consumer
            .await
            .map_err(|err| anyhow!("consumer task failed: {err}"))?;
        info!("watch service stopped");
        Ok(())
    }
}

impl<B: CommandBackend + Clone + 'static> Service for WatchService<B> {
    fn start(&mut self) -> Result<()> {
        WatchService::start(self)
    }

    fn stop(&mut self) -> Result<()> {
        WatchService::stop(self)
    }
}
