//! In-process throttle store
//!
//! A map of key to deadline behind an async mutex. Expired entries are
//! dropped lazily on lookup and swept opportunistically on insert once the
//! map grows past a threshold.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use super::{ThrottleError, ThrottleStore};

/// Sweep the whole map once it holds this many entries.
const SWEEP_THRESHOLD: usize = 4096;

/// In-memory `ThrottleStore` backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryThrottleStore {
    entries: Arc<Mutex<HashMap<String, Instant>>>,
}

impl MemoryThrottleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries (expired entries still pending sweep count too).
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl ThrottleStore for MemoryThrottleStore {
    async fn exists(&self, key: &str) -> Result<bool, ThrottleError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(deadline) if *deadline > Instant::now() => Ok(true),
            Some(_) => {
                entries.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn record(&self, key: &str, ttl: Duration) -> Result<(), ThrottleError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        if entries.len() >= SWEEP_THRESHOLD {
            entries.retain(|_, deadline| *deadline > now);
        }

        // First write wins: keep the original deadline if still live.
        match entries.get(key) {
            Some(deadline) if *deadline > now => {}
            _ => {
                entries.insert(key.to_string(), now + ttl);
            }
        }

        Ok(())
    }
}
