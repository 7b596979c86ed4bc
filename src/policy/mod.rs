//! Extension Policy Module
//!
//! Decides whether an installed extension is allowed, denied or unknown.
//!
//! ## Structure
//! - `set`: PolicySet (per-category whitelist + global blacklist)
//! - `classifier`: pure classification
//! - `store`: backend-confirmed cache of one device's policy
//!
//! ## Usage
//! ```ignore
//! let mut store = PolicyStore::new("lab-pc-01");
//! store.refresh(&client).await?;
//! match classify(&extension, store.policy()) {
//!     Classification::Whitelisted => show_compliant(),
//!     Classification::Blacklisted => show_blocked(),
//!     Classification::Unclassified => offer_blacklist(),
//! }
//! ```

pub mod classifier;
pub mod set;
pub mod store;


pub use classifier::{classify, classify_all, Classification};
pub use set::{PolicyChange, PolicySet, BLACKLIST_WIRE_KEY};
pub use store::PolicyStore;
