//! In-flight guard
//!
//! At most one outstanding dispatch per (device, resource). A second
//! dispatch is rejected, not queued, while the first is unanswered.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{ConsoleError, ConsoleResult};

#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    keys: Arc<Mutex<HashSet<String>>>,
}

/// Held for the duration of one dispatch; releases its key on drop.
#[derive(Debug)]
pub struct InFlightToken {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, key: String) -> ConsoleResult<InFlightToken> {
        let mut keys = self.keys.lock();
        if !keys.insert(key.clone()) {
            return Err(ConsoleError::InFlight(key));
        }
        Ok(InFlightToken {
            keys: Arc::clone(&self.keys),
            key,
        })
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.keys.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.lock().is_empty()
    }
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        self.keys.lock().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_rejected_until_release() {
        let registry = InFlightRegistry::new();
        let token = registry.try_acquire("d1/service:bar".to_string()).unwrap();

        let err = registry.try_acquire("d1/service:bar".to_string()).unwrap_err();
        assert_eq!(err, ConsoleError::InFlight("d1/service:bar".to_string()));
        assert!(registry.try_acquire("d1/service:foo".to_string()).is_ok());

        drop(token);
        assert!(!registry.is_in_flight("d1/service:bar"));
        assert!(registry.try_acquire("d1/service:bar".to_string()).is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let registry = InFlightRegistry::new();
        let other = registry.clone();
        let _token = registry.try_acquire("d1/device".to_string()).unwrap();
        assert!(other.is_in_flight("d1/device"));
        assert_eq!(other.len(), 1);
    }
}
