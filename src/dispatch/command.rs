//! Command Types
//!
//! A command is a value object: created on operator intent, consumed by the
//! dispatcher, and discarded once the backend answers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConsoleError, ConsoleResult};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Allowed USB enable windows, in minutes.
pub const USB_DURATIONS_MINUTES: [u32; 8] = [5, 15, 30, 60, 120, 360, 720, 1440];

// ============================================================================
// ACTIONS & TARGETS
// ============================================================================

/// Operational action requested from a device agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    // Device scope
    Shutdown,
    Restart,
    Lock,
    Unlock,
    RemoteAccess,
    EnableUsb,
    Patch,
    // Service scope (Restart is shared with device scope)
    Start,
    Stop,
    Disable,
    Delete,
    // Process scope
    Kill,
    // Software scope
    Uninstall,
    // Extension scope
    Remove,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Shutdown => "shutdown",
            Action::Restart => "restart",
            Action::Lock => "lock",
            Action::Unlock => "unlock",
            Action::RemoteAccess => "remote",
            Action::EnableUsb => "enable-usb",
            Action::Patch => "patch",
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Disable => "disable",
            Action::Delete => "delete",
            Action::Kill => "kill",
            Action::Uninstall => "uninstall",
            Action::Remove => "remove",
        }
    }

    /// Actions that must never be retried blindly.
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, Action::Kill | Action::Delete | Action::Uninstall | Action::Remove)
    }

    /// Whether `self` makes sense against `target`.
    pub fn applies_to(&self, target: &Target) -> bool {
        match target {
            Target::Device => matches!(
                self,
                Action::Shutdown
                    | Action::Restart
                    | Action::Lock
                    | Action::Unlock
                    | Action::RemoteAccess
                    | Action::EnableUsb
                    | Action::Patch
            ),
            Target::Service(_) => matches!(
                self,
                Action::Start | Action::Stop | Action::Restart | Action::Disable | Action::Delete
            ),
            Target::Process(_) => matches!(self, Action::Kill),
            Target::Software(_) => matches!(self, Action::Uninstall),
            Target::Extension(_) => matches!(self, Action::Remove),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource a command is aimed at, within one device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum Target {
    Device,
    Software(String),
    Service(String),
    Process(String),
    Extension(String),
}

impl Target {
    pub fn name(&self) -> Option<&str> {
        match self {
            Target::Device => None,
            Target::Software(name)
            | Target::Service(name)
            | Target::Process(name)
            | Target::Extension(name) => Some(name),
        }
    }

    pub fn scope(&self) -> &'static str {
        match self {
            Target::Device => "device",
            Target::Software(_) => "software",
            Target::Service(_) => "service",
            Target::Process(_) => "process",
            Target::Extension(_) => "extension",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} '{}'", self.scope(), name),
            None => f.write_str("device"),
        }
    }
}

/// How long a process kill stays armed on the agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KillMode {
    #[default]
    Once,
    Forever,
}

/// Optional command argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandPayload {
    DurationMinutes(u32),
    KillMode(KillMode),
}

// ============================================================================
// COMMAND
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub device_id: String,
    pub target: Target,
    pub action: Action,
    pub payload: Option<CommandPayload>,
}

impl Command {
    pub fn device(device_id: impl Into<String>, action: Action) -> Self {
        Self {
            device_id: device_id.into(),
            target: Target::Device,
            action,
            payload: None,
        }
    }

    pub fn enable_usb(device_id: impl Into<String>, minutes: u32) -> Self {
        Self::device(device_id, Action::EnableUsb).with_payload(CommandPayload::DurationMinutes(minutes))
    }

    pub fn service(device_id: impl Into<String>, name: impl Into<String>, action: Action) -> Self {
        Self {
            device_id: device_id.into(),
            target: Target::Service(name.into()),
            action,
            payload: None,
        }
    }

    pub fn uninstall(device_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            target: Target::Software(name.into()),
            action: Action::Uninstall,
            payload: None,
        }
    }

    pub fn kill(device_id: impl Into<String>, name: impl Into<String>, mode: KillMode) -> Self {
        Self {
            device_id: device_id.into(),
            target: Target::Process(name.into()),
            action: Action::Kill,
            payload: Some(CommandPayload::KillMode(mode)),
        }
    }

    pub fn remove_extension(device_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            target: Target::Extension(name.into()),
            action: Action::Remove,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: CommandPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Local checks that must pass before anything goes on the wire.
    pub fn validate(&self) -> ConsoleResult<()> {
        if self.device_id.trim().is_empty() {
            return Err(ConsoleError::Validation("device id must not be empty".to_string()));
        }

        if !self.action.applies_to(&self.target) {
            return Err(ConsoleError::Validation(format!(
                "{} is not a valid action for {}",
                self.action, self.target
            )));
        }

        if let Some(name) = self.target.name() {
            if name.trim().is_empty() {
                return Err(ConsoleError::Validation(format!(
                    "{} name must not be empty",
                    self.target.scope()
                )));
            }
        }

        match (self.action, self.payload) {
            (Action::EnableUsb, Some(CommandPayload::DurationMinutes(minutes))) => {
                if USB_DURATIONS_MINUTES.contains(&minutes) {
                    Ok(())
                } else {
                    Err(ConsoleError::Validation(format!(
                        "USB duration {} min is not one of {:?}",
                        minutes, USB_DURATIONS_MINUTES
                    )))
                }
            }
            (Action::EnableUsb, _) => Err(ConsoleError::Validation(
                "enable-usb requires a duration in minutes".to_string(),
            )),
            (Action::Kill, None | Some(CommandPayload::KillMode(_))) => Ok(()),
            (_, None) => Ok(()),
            (action, Some(payload)) => Err(ConsoleError::Validation(format!(
                "{} does not take a {:?} argument",
                action, payload
            ))),
        }
    }

    /// In-flight guard key: one outstanding dispatch per (device, resource).
    pub fn resource_key(&self) -> String {
        match self.target.name() {
            Some(name) => format!("{}/{}:{}", self.device_id, self.target.scope(), name.trim().to_lowercase()),
            None => format!("{}/device", self.device_id),
        }
    }
}

// ============================================================================
// ACKNOWLEDGEMENT
// ============================================================================

/// What the console can know about a dispatched command.
///
/// Agents apply queued commands on their next run; whether that succeeds is
/// never reported back to this client, so `Queued` is the only state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandState {
    Queued,
}

/// Backend accepted and queued the command. Not a completion signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub request_id: Uuid,
    pub device_id: String,
    pub action: Action,
    pub target: Target,
    pub state: CommandState,
    /// Raw backend response body, e.g. `{"status": "queued"}`.
    pub response: serde_json::Value,
    pub queued_at: DateTime<Utc>,
}

impl Ack {
    pub fn message(&self) -> String {
        format!(
            "{} queued for {} on {}. It will be applied during the next agent run.",
            self.action, self.target, self.device_id
        )
    }
}
