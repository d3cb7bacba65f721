use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::models::Prediction;

// Cache entry with timestamp
#[derive(Clone)]
pub struct CacheEntry {
    pub predictions: Vec<Prediction>,
    pub created_at: Instant,
}

// Predictions keyed by the hash of the exact crop that was scored.
// Cloning shares the same map.
#[derive(Clone)]
pub struct PredictionCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
}

// Create a cache key (hash of the cropped image bytes)
pub fn make_cache_key(crop: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(crop);
    format!("{:x}", hasher.finalize())
}

impl PredictionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<Prediction>> {
        let entry = self.entries.get(key)?;
        if entry.created_at.elapsed() < self.ttl {
            Some(entry.predictions.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: String, predictions: Vec<Prediction>) {
        self.entries.insert(
            key,
            CacheEntry {
                predictions,
                created_at: Instant::now(),
            },
        );
    }

    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.created_at.elapsed() < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
