//! Device model

use serde::{Deserialize, Serialize};

/// A monitored endpoint. Only `status` changes between polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default = "unknown", rename = "ip")]
    pub ip_address: String,
    #[serde(default = "unknown")]
    pub os: String,
    #[serde(default)]
    pub status: DeviceStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    #[default]
    #[serde(other)]
    Offline,
}

impl Device {
    pub fn is_online(&self) -> bool {
        self.status == DeviceStatus::Online
    }

    /// Hostname, falling back to the id for devices that only sent extensions.
    pub fn display_name(&self) -> &str {
        if self.hostname.is_empty() {
            &self.id
        } else {
            &self.hostname
        }
    }
}

/// Result of the last patch run reported by the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl PatchStatus {
    pub fn is_pending(&self) -> bool {
        self.status.eq_ignore_ascii_case("pending")
    }
}

fn unknown() -> String {
    "unknown".to_string()
}
