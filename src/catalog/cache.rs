use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// In-memory store of raw response bodies with a fixed time-to-live.
#[derive(Clone)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Arc<Mutex<HashMap<String, (Instant, String)>>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }

        let Ok(mut entries) = self.entries.lock() else {
            warn!("Response cache lock poisoned, treating as miss");
            return None;
        };

        match entries.get(key) {
            Some((stored_at, body)) if stored_at.elapsed() < self.ttl => {
                debug!(key, "Response cache hit");
                Some(body.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: impl Into<String>, body: String) {
        if !self.is_enabled() {
            return;
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.into(), (Instant::now(), body));
        }
    }

    /// Drop every entry past its TTL.
    pub fn purge_expired(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            let ttl = self.ttl;
            entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(3600));
        cache.insert("/movie/popular?page=1", "{}".to_string());
        assert_eq!(cache.get("/movie/popular?page=1").as_deref(), Some("{}"));
        assert_eq!(cache.get("/movie/popular?page=2"), None);
    }

    #[test]
    fn test_expired_entry_is_never_served() {
        let cache = ResponseCache::new(Duration::from_millis(20));
        cache.insert("k", "body".to_string());
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_zero_ttl_disables() {
        let cache = ResponseCache::new(Duration::ZERO);
        cache.insert("k", "body".to_string());
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_purge_expired() {
        let cache = ResponseCache::new(Duration::from_millis(20));
        cache.insert("a", "1".to_string());
        cache.insert("b", "2".to_string());
        std::thread::sleep(Duration::from_millis(40));
        cache.purge_expired();
        assert_eq!(cache.len(), 0);
    }
}
