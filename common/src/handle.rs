//! Revocable display handles
//!
//! A handle lets a consumer show or save an artifact by URL without copying
//! its bytes. Handles are not `Clone`: each has exactly one owner and must be
//! given back to the registry through [`HandleRegistry::revoke`].

use std::collections::HashMap;
use std::sync::Arc;

const URL_PREFIX: &str = "blob:nobg/";

/// Exclusive reference to bytes registered in a [`HandleRegistry`]
#[derive(Debug, PartialEq, Eq)]
pub struct Handle {
    key: u64,
}

impl Handle {
    pub fn url(&self) -> String {
        format!("{}{}", URL_PREFIX, self.key)
    }

    pub(crate) fn key(&self) -> u64 {
        self.key
    }
}

/// Allocation counters, for leak checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleStats {
    pub created: u64,
    pub revoked: u64,
}

impl HandleStats {
    pub fn live(&self) -> u64 {
        self.created - self.revoked
    }
}

#[derive(Debug, Default)]
pub struct HandleRegistry {
    next_key: u64,
    live: HashMap<u64, Arc<[u8]>>,
    stats: HandleStats,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, bytes: Arc<[u8]>) -> Handle {
        self.next_key += 1;
        let key = self.next_key;
        self.live.insert(key, bytes);
        self.stats.created += 1;
        Handle { key }
    }

    /// Frees the handle; its URL stops resolving immediately
    pub fn revoke(&mut self, handle: Handle) {
        if self.live.remove(&handle.key).is_some() {
            self.stats.revoked += 1;
        }
    }

    pub fn resolve(&self, url: &str) -> Option<Arc<[u8]>> {
        let key = url.strip_prefix(URL_PREFIX)?.parse::<u64>().ok()?;
        self.live.get(&key).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn stats(&self) -> HandleStats {
        self.stats
    }
}
