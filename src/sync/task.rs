//! Refresh Task
//!
//! Runs an async job at a fixed period on a tokio task. The first run
//! happens immediately. `shutdown()` waits for the loop to exit; dropping
//! the handle aborts it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::ConsoleResult;

/// Counters for one scheduled job
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshStatus {
    pub runs: u64,
    pub failures: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

pub struct RefreshTask {
    name: String,
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
    status: Arc<RwLock<RefreshStatus>>,
}

impl RefreshTask {
    pub fn spawn<F, Fut>(name: impl Into<String>, period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ConsoleResult<()>> + Send + 'static,
    {
        let name = name.into();
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let status = Arc::new(RwLock::new(RefreshStatus::default()));

        let task_name = name.clone();
        let task_status = Arc::clone(&status);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    // Signal or dropped sender
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        let result = job().await;
                        let mut status = task_status.write();
                        status.runs += 1;
                        status.last_run = Some(Utc::now());
                        match result {
                            Ok(()) => status.last_error = None,
                            Err(e) => {
                                tracing::warn!("Refresh '{}' failed: {}", task_name, e);
                                status.failures += 1;
                                status.last_error = Some(e.to_string());
                            }
                        }
                    }
                }
            }

            tracing::debug!("Refresh '{}' stopped", task_name);
        });

        tracing::info!("Started refresh '{}' every {:?}", name, period);
        Self {
            name,
            shutdown_tx,
            handle: Some(handle),
            status,
        }
    }

    pub fn status(&self) -> RefreshStatus {
        self.status.read().clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the loop and wait for it to exit. A run in progress completes
    /// first.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!("Refresh '{}' ended abnormally: {}", self.name, e);
            }
        }
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
