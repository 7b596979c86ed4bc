//! Search Filter
//!
//! Stateless narrowing of locally held collections. Matching is a
//! case-insensitive substring test; results keep source order and are
//! recomputed from scratch on every call.

use serde::{Deserialize, Serialize};

use crate::models::{AuditLogEntry, Device, Extension, ServiceItem, SoftwareItem, LifecycleState};
use crate::policy::{classify, Classification, PolicySet};

// ============================================================================
// TABS
// ============================================================================

/// Mutually exclusive extension views, keyed on classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionTab {
    #[default]
    Whitelisted,
    NotWhitelisted,
    Blacklisted,
}

impl ExtensionTab {
    pub fn accepts(&self, classification: Classification) -> bool {
        matches!(
            (self, classification),
            (ExtensionTab::Whitelisted, Classification::Whitelisted)
                | (ExtensionTab::NotWhitelisted, Classification::Unclassified)
                | (ExtensionTab::Blacklisted, Classification::Blacklisted)
        )
    }
}

/// Software/service views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InventoryTab {
    #[default]
    All,
    Running,
    Installed,
    RunningServices,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionQuery {
    pub tab: ExtensionTab,
    pub search: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryQuery {
    pub tab: InventoryTab,
    pub search: String,
}

/// Result of an inventory query: the services tab yields a different
/// collection than the software tabs.
#[derive(Debug, Clone, PartialEq)]
pub enum InventorySelection<'a> {
    Software(Vec<&'a SoftwareItem>),
    Services(Vec<&'a ServiceItem>),
}

impl InventorySelection<'_> {
    pub fn len(&self) -> usize {
        match self {
            InventorySelection::Software(items) => items.len(),
            InventorySelection::Services(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            InventorySelection::Software(items) => items.iter().map(|s| s.name.as_str()).collect(),
            InventorySelection::Services(items) => items.iter().map(|s| s.name.as_str()).collect(),
        }
    }
}

// ============================================================================
// PREDICATES
// ============================================================================

/// Case-insensitive substring match; an empty needle matches everything.
pub fn matches_text(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn filter_extensions<'a>(
    extensions: &'a [Extension],
    policy: &PolicySet,
    query: &ExtensionQuery,
) -> Vec<&'a Extension> {
    extensions
        .iter()
        .filter(|e| query.tab.accepts(classify(e, policy)))
        .filter(|e| matches_text(&e.name, &query.search))
        .collect()
}

pub fn filter_inventory<'a>(
    software: &'a [SoftwareItem],
    services: &'a [ServiceItem],
    query: &InventoryQuery,
) -> InventorySelection<'a> {
    let wanted_state = match query.tab {
        InventoryTab::RunningServices => {
            return InventorySelection::Services(
                services
                    .iter()
                    .filter(|s| matches_text(&s.name, &query.search))
                    .collect(),
            );
        }
        InventoryTab::All => None,
        InventoryTab::Running => Some(LifecycleState::Running),
        InventoryTab::Installed => Some(LifecycleState::Installed),
    };

    InventorySelection::Software(
        software
            .iter()
            .filter(|s| wanted_state.map_or(true, |state| s.state == state))
            .filter(|s| matches_text(&s.name, &query.search))
            .collect(),
    )
}

/// Devices matching on hostname, address or operating system.
pub fn filter_devices<'a>(devices: &'a [Device], search: &str) -> Vec<&'a Device> {
    devices
        .iter()
        .filter(|d| {
            matches_text(&d.hostname, search) || matches_text(&d.ip_address, search) || matches_text(&d.os, search)
        })
        .collect()
}

/// Log entries matching across user, action, device and details jointly.
pub fn filter_audit_logs<'a>(entries: &'a [AuditLogEntry], search: &str) -> Vec<&'a AuditLogEntry> {
    entries
        .iter()
        .filter(|e| {
            let joined = [
                e.user.as_str(),
                e.action.as_str(),
                e.device.as_str(),
                e.details().unwrap_or(""),
            ]
            .join(" ");
            matches_text(&joined, search)
        })
        .collect()
}
