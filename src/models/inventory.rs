//! Software, process and service inventory

use serde::{Deserialize, Serialize};

/// Lifecycle state as last reported by the agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Running,
    Installed,
    Stopped,
    #[default]
    #[serde(other)]
    Unknown,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Running => "running",
            LifecycleState::Installed => "installed",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Unknown => "unknown",
        }
    }
}

/// Entry of the software inventory.
///
/// Running processes ride the same collection with `kind == "process"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareItem {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub state: LifecycleState,
}

impl SoftwareItem {
    pub fn is_process(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| k.eq_ignore_ascii_case("process"))
    }

    /// Running processes are killed, everything else is uninstalled.
    pub fn is_killable(&self) -> bool {
        self.is_process() && self.state == LifecycleState::Running
    }
}

/// Process view of a software entry.
pub type ProcessItem = SoftwareItem;

/// Entry of the service inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: LifecycleState,
    #[serde(default)]
    pub startup: Option<String>,
    #[serde(default)]
    pub cpu: Option<serde_json::Value>,
    #[serde(default)]
    pub ram: Option<serde_json::Value>,
}

impl ServiceItem {
    pub fn is_running(&self) -> bool {
        self.status == LifecycleState::Running
    }
}
