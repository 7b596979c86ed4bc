//! Scheduled feeds
//!
//! Read-only collections kept current by a `RefreshTask`: the audit log
//! (one device or the fleet-wide command log) and device status.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use super::task::{RefreshStatus, RefreshTask};
use crate::api::ConsoleClient;
use crate::models::{AuditLogEntry, Device};
use crate::view::{filter_audit_logs, filter_devices};

/// A refresh task plus the latest snapshot it produced.
pub struct Feed<T> {
    task: RefreshTask,
    latest: Arc<RwLock<Vec<T>>>,
}

impl<T: Clone> Feed<T> {
    pub fn snapshot(&self) -> Vec<T> {
        self.latest.read().clone()
    }

    pub fn len(&self) -> usize {
        self.latest.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.read().is_empty()
    }

    pub fn status(&self) -> RefreshStatus {
        self.task.status()
    }

    pub async fn shutdown(self) {
        self.task.shutdown().await
    }
}

impl Feed<AuditLogEntry> {
    pub fn search(&self, query: &str) -> Vec<AuditLogEntry> {
        let latest = self.latest.read();
        filter_audit_logs(&latest, query).into_iter().cloned().collect()
    }
}

impl Feed<Device> {
    pub fn search(&self, query: &str) -> Vec<Device> {
        let latest = self.latest.read();
        filter_devices(&latest, query).into_iter().cloned().collect()
    }

    pub fn online(&self) -> usize {
        self.latest.read().iter().filter(|d| d.is_online()).count()
    }
}

/// Audit entries for `device_id`, or the fleet-wide command log when `None`.
pub fn audit_log_feed(client: ConsoleClient, device_id: Option<String>, period: Duration) -> Feed<AuditLogEntry> {
    let latest = Arc::new(RwLock::new(Vec::new()));
    let sink = Arc::clone(&latest);
    let name = match &device_id {
        Some(id) => format!("audit-log:{}", id),
        None => "command-log".to_string(),
    };

    let task = RefreshTask::spawn(name, period, move || {
        let client = client.clone();
        let device_id = device_id.clone();
        let sink = Arc::clone(&sink);
        async move {
            let entries = match device_id {
                Some(id) => client.audit_logs(&id).await?,
                None => client.command_log().await?,
            };
            *sink.write() = entries;
            Ok(())
        }
    });

    Feed { task, latest }
}

/// Device list with online/offline status.
pub fn device_feed(client: ConsoleClient, period: Duration) -> Feed<Device> {
    let latest = Arc::new(RwLock::new(Vec::new()));
    let sink = Arc::clone(&latest);

    let task = RefreshTask::spawn("devices", period, move || {
        let client = client.clone();
        let sink = Arc::clone(&sink);
        async move {
            let devices = client.list_devices().await?;
            *sink.write() = devices;
            Ok(())
        }
    });

    Feed { task, latest }
}
