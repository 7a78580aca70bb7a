//! Race-tolerant health cache (spec.md §4.4).
//!
//! The stored `(healthy, last_check_time)` pair may be read concurrently;
//! readers observe either an old-but-valid or a fresh value — there is no
//! lock held across the probe itself, only around the read/write of the
//! cached pair.

use std::sync::Mutex;
use std::time::{Duration, Instant};

const HEALTHY_TTL: Duration = Duration::from_secs(30);

pub struct HealthCache {
    state: Mutex<Option<(bool, Instant)>>,
}

impl HealthCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(None),
        }
    }

    /// Returns `Some(cached)` if the last check was healthy and within the
    /// 30s TTL; `None` otherwise, meaning the caller must re-probe.
    pub fn cached(&self) -> Option<bool> {
        let guard = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match *guard {
            Some((true, checked_at)) if checked_at.elapsed() < HEALTHY_TTL => Some(true),
            _ => None,
        }
    }

    pub fn record(&self, healthy: bool) {
        let mut guard = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Some((healthy, Instant::now()));
    }
}

impl Default for HealthCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unhealthy_is_never_cached() {
        let cache = HealthCache::new();
        cache.record(false);
        assert_eq!(cache.cached(), None);
    }

    #[test]
    fn healthy_is_cached_until_ttl() {
        let cache = HealthCache::new();
        cache.record(true);
        assert_eq!(cache.cached(), Some(true));
    }
}
