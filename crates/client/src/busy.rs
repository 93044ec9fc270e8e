//! Per-action in-flight guard.
//!
//! Advisory only: it stops a second submission of the same action from this
//! process while the first is still outstanding. The backend stays the
//! authority on duplicates.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Default)]
pub struct InFlight {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`, failing fast with [`ClientError::Busy`] if it is taken.
    pub fn begin(&self, key: impl Into<String>) -> ClientResult<BusyGuard> {
        let key = key.into();
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        if !keys.insert(key.clone()) {
            return Err(ClientError::Busy(key));
        }
        Ok(BusyGuard {
            key,
            keys: Arc::clone(&self.keys),
        })
    }

    pub fn is_busy(&self, key: &str) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
    }
}

/// Releases its key on drop, including when the request future is dropped.
#[derive(Debug)]
pub struct BusyGuard {
    key: String,
    keys: Arc<Mutex<HashSet<String>>>,
}

impl BusyGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_fails_until_released() {
        let in_flight = InFlight::new();
        let guard = in_flight.begin("grn.finalize:g-1").unwrap();
        assert!(in_flight.is_busy("grn.finalize:g-1"));

        let err = in_flight.begin("grn.finalize:g-1").unwrap_err();
        assert!(matches!(err, ClientError::Busy(ref k) if k == "grn.finalize:g-1"));

        drop(guard);
        assert!(!in_flight.is_busy("grn.finalize:g-1"));
        assert!(in_flight.begin("grn.finalize:g-1").is_ok());
    }

    #[test]
    fn distinct_keys_do_not_block_each_other() {
        let in_flight = InFlight::new();
        let _a = in_flight.begin("adjustment.submit:a-1").unwrap();
        let _b = in_flight.begin("adjustment.submit:a-2").unwrap();
        assert_eq!(_a.key(), "adjustment.submit:a-1");
    }

    #[test]
    fn clones_share_state() {
        let in_flight = InFlight::new();
        let other = in_flight.clone();
        let _guard = in_flight.begin("exchange.create").unwrap();
        assert!(other.begin("exchange.create").is_err());
    }
}
