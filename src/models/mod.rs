//! Data models
//!
//! Wire types returned by the dashboard backend. Everything here is rebuilt
//! from each fetch; nothing has a lifecycle beyond the response it came from.

pub mod device;
pub mod extension;
pub mod inventory;
pub mod audit;

pub use device::*;
pub use extension::*;
pub use inventory::*;
pub use audit::*;
