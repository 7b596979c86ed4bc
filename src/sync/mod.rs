//! Scheduled refresh
//!
//! Periodic re-fetching runs as explicit, cancellable tokio tasks owned by
//! whoever started them.

pub mod feeds;
pub mod task;

pub use feeds::{audit_log_feed, device_feed, Feed};
pub use task::{RefreshStatus, RefreshTask};
