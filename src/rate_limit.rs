use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Tracked keys above which every call also sweeps stale keys.
const SWEEP_THRESHOLD: usize = 1024;

/// In-memory sliding-window limiter keyed by `"<bucket>:<ip_hash>"`.
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

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Instant>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record an attempt and return true if it is allowed (under the limit).
    pub fn check_and_record(&self, key: &str, max_attempts: u64, window: Duration) -> bool {
        let mut map = self.lock();
        let now = Instant::now();
        if map.len() >= SWEEP_THRESHOLD {
            cleanup(&mut map, now, window);
        }

        let attempts = map.entry(key.to_string()).or_default();
        attempts.retain(|t| now.duration_since(*t) < window);

        if (attempts.len() as u64) < max_attempts {
            attempts.push(now);
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.lock().len()
    }
}

/// Drop attempts older than `max_age`, and keys left with none.
fn cleanup(map: &mut HashMap<String, Vec<Instant>>, now: Instant, max_age: Duration) {
    map.retain(|_, attempts| {
        attempts.retain(|t| now.duration_since(*t) < max_age);
        !attempts.is_empty()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_max_attempts() {
        let rl = RateLimiter::new();
        let w = Duration::from_secs(60);
        assert!(rl.check_and_record("login:a", 2, w));
        assert!(rl.check_and_record("login:a", 2, w));
        assert!(!rl.check_and_record("login:a", 2, w));
        // Other keys are independent
        assert!(rl.check_and_record("login:b", 2, w));
    }

    #[test]
    fn window_expiry_frees_slots() {
        let rl = RateLimiter::new();
        assert!(rl.check_and_record("contact:x", 1, Duration::ZERO));
        assert!(rl.check_and_record("contact:x", 1, Duration::ZERO));
    }

    #[test]
    fn stale_keys_are_swept_once_map_grows() {
        let rl = RateLimiter::new();
        for i in 0..SWEEP_THRESHOLD {
            assert!(rl.check_and_record(&format!("login:{}", i), 5, Duration::ZERO));
        }
        assert_eq!(rl.tracked_keys(), SWEEP_THRESHOLD);

        // All earlier attempts are outside a zero window, so the sweep leaves only this key.
        assert!(rl.check_and_record("login:fresh", 5, Duration::ZERO));
        assert_eq!(rl.tracked_keys(), 1);
    }
}
