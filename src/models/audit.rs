//! Audit / command log entries

use serde::{Deserialize, Serialize};

/// One operator action recorded by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub user: String,
    pub action: String,
    pub device: String,
    pub timestamp: String,
    #[serde(default)]
    pub details: Option<String>,
}

impl AuditLogEntry {
    /// Backend writes "-" when no details were recorded.
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref().filter(|d| !d.is_empty() && *d != "-")
    }
}
