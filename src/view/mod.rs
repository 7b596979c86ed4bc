//! Device view state
//!
//! `DeviceView` owns everything one open device page shows: inventories,
//! the policy cache and the ledger of queued commands. The filter
//! functions are pure and can be used on any slice.

pub mod filter;
pub mod reconciliation;

#[cfg(test)]
mod tests;

pub use filter::{
    filter_audit_logs, filter_devices, filter_extensions, filter_inventory, matches_text, ExtensionQuery,
    ExtensionTab, InventoryQuery, InventorySelection, InventoryTab,
};
pub use reconciliation::{Collection, DeviceView, DispatchOutcome, LocalEffect, MAX_HISTORY};
