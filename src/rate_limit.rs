use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// In-memory sliding-window rate limiter keyed by "<bucket>:<ip_hash>".
pub struct RateLimiter {
    entries: Mutex<HashMap<String, Vec<Instant>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        RateLimiter {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Record an attempt and return true if it is allowed (under the limit).
    pub fn check_and_record(&self, key: &str, max_attempts: u64, window: Duration) -> bool {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        let attempts = map.entry(key.to_string()).or_default();
        attempts.retain(|t| now.duration_since(*t) < window);

        if (attempts.len() as u64) < max_attempts {
            attempts.push(now);
            true
        } else {
            false
        }
    }

    /// Forget a key, e.g. after a successful login.
    pub fn reset(&self, key: &str) {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(key);
    }

    /// Drop stale entries. Called from the background task loop.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let before = map.len();
        map.retain(|_, attempts| {
            attempts.retain(|t| now.duration_since(*t) < max_age);
            !attempts.is_empty()
        });
        before - map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_limit() {
        let rl = RateLimiter::new();
        let w = Duration::from_secs(60);
        assert!(rl.check_and_record("login:a", 2, w));
        assert!(rl.check_and_record("login:a", 2, w));
        assert!(!rl.check_and_record("login:a", 2, w));
        // Other keys are independent
        assert!(rl.check_and_record("login:b", 2, w));
    }

    #[test]
    fn reset_and_cleanup() {
        let rl = RateLimiter::new();
        let w = Duration::from_secs(60);
        assert!(rl.check_and_record("k", 1, w));
        assert!(!rl.check_and_record("k", 1, w));
        rl.reset("k");
        assert!(rl.check_and_record("k", 1, w));

        assert_eq!(rl.cleanup(Duration::ZERO), 1);
        assert!(rl.check_and_record("k", 1, w));
    }
}
