//! Session liveness registry.
//!
//! The tracker maps a session key to a liveness flag. The orchestrator
//! registers its key when a session starts, polls it while working, and
//! removes it when the session closes; a stop request only clears the flag.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use frameqa_models::SessionKey;
use tracing::debug;

/// Thread-safe registry of live analysis sessions.
#[derive(Debug, Default)]
pub struct SessionTracker {
    sessions: RwLock<HashMap<SessionKey, bool>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` live, overwriting any stale entry.
    pub fn register(&self, key: &SessionKey) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if sessions.insert(key.clone(), true).is_some() {
            debug!(session_key = %key, "Overwrote existing session entry");
        }
    }

    /// Whether `key` is registered and has not been stopped.
    pub fn is_live(&self, key: &SessionKey) -> bool {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(key).copied().unwrap_or(false)
    }

    /// Clear the liveness flag of `key`, keeping the entry.
    ///
    /// Returns false when no session is registered under `key`; nothing is
    /// inserted in that case.
    pub fn stop(&self, key: &SessionKey) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        match sessions.get_mut(key) {
            Some(live) => {
                *live = false;
                true
            }
            None => false,
        }
    }

    /// Delete the entry for `key`. Returns whether one existed.
    pub fn remove(&self, key: &SessionKey) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(key).is_some()
    }

    /// Whether an entry (live or stopped) exists for `key`.
    pub fn contains(&self, key: &SessionKey) -> bool {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.contains_key(key)
    }

    /// Number of tracked sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of sessions that are still live.
    pub fn active_keys(&self) -> Vec<SessionKey> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<SessionKey> = sessions
            .iter()
            .filter(|(_, live)| **live)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn key(s: &str) -> SessionKey {
        SessionKey::for_video(s)
    }

    #[test]
    fn test_absent_key_is_not_live() {
        let tracker = SessionTracker::new();
        assert!(!tracker.is_live(&key("cat.mp4")));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_register_stop_remove() {
        let tracker = SessionTracker::new();
        let k = key("cat.mp4");

        tracker.register(&k);
        assert!(tracker.is_live(&k));

        assert!(tracker.stop(&k));
        assert!(!tracker.is_live(&k));
        assert!(tracker.contains(&k));

        assert!(tracker.remove(&k));
        assert!(!tracker.contains(&k));
        assert!(!tracker.remove(&k), "second remove is a no-op");
    }

    #[test]
    fn test_stop_unknown_key_does_not_insert() {
        let tracker = SessionTracker::new();
        assert!(!tracker.stop(&key("gone.mp4")));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_register_overwrites_stopped_entry() {
        let tracker = SessionTracker::new();
        let k = key("cat.mp4");
        tracker.register(&k);
        tracker.stop(&k);
        tracker.register(&k);
        assert!(tracker.is_live(&k));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_active_keys_excludes_stopped() {
        let tracker = SessionTracker::new();
        tracker.register(&key("b.mp4"));
        tracker.register(&key("a.mp4"));
        tracker.register(&key("c.mp4"));
        tracker.stop(&key("c.mp4"));

        let active: Vec<String> = tracker
            .active_keys()
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(active, vec!["amp4", "bmp4"]);
    }

    #[test]
    fn test_concurrent_access() {
        let tracker = Arc::new(SessionTracker::new());
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    let k = SessionKey::for_video(&format!("video{}.mp4", n));
                    for _ in 0..100 {
                        tracker.register(&k);
                        assert!(tracker.is_live(&k));
                        tracker.stop(&k);
                    }
                    tracker.remove(&k);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(tracker.is_empty());
    }
}
