use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

// Rate limit entry - tracks requests per IP/key inside the current window
#[derive(Debug, Clone, Copy)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_time: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_time: Instant,
}

impl RateLimitDecision {
    // Whole seconds until the window resets, never less than 1
    pub fn retry_after_secs(&self, now: Instant) -> u64 {
        let wait = self.reset_time.saturating_duration_since(now);
        let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
        secs.max(1)
    }
}

// Time source for the limiter. Must be monotonic.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// Clock that only moves when told to
pub struct ManualClock {
    base: Instant,
    offset_nanos: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_nanos: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset_nanos.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_nanos(self.offset_nanos.load(Ordering::SeqCst))
    }
}

/// Fixed-window request counter, one window per identifier.
///
/// Windows reset hard: a client can get up to twice the limit through in a
/// short span straddling a boundary.
///
/// Only works within one process. Several gateway instances each count on
/// their own.
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    // Admit or reject one request from `identifier`
    pub fn check_rate_limit(&self, identifier: &str, config: &RateLimitConfig) -> RateLimitDecision {
        let now = self.clock.now();

        // the entry guard holds the shard lock until the end of this function,
        // so check-and-increment is atomic per identifier
        let mut entry = self
            .entries
            .entry(identifier.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                reset_time: now + config.window,
            });

        // window expired..? start a fresh one
        if now > entry.reset_time {
            *entry = RateLimitEntry {
                count: 0,
                reset_time: now + config.window,
            };
        }

        if entry.count >= config.max_requests {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_time: entry.reset_time,
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: config.max_requests - entry.count,
            reset_time: entry.reset_time,
        }
    }

    // Drop every entry whose window is already over. Returns how many went.
    pub fn sweep_expired(&self) -> usize {
        let before = self.entries.len();
        // retain locks one shard at a time and reads the clock per entry,
        // so an entry refreshed meanwhile is never removed
        self.entries.retain(|_, entry| !(self.clock.now() > entry.reset_time));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RateLimitConfig {
        RateLimitConfig {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }

    fn limiter() -> (Arc<ManualClock>, RateLimiter) {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::with_clock(clock.clone());
        (clock, limiter)
    }

    #[test]
    fn admits_exactly_max_requests() {
        let (_, limiter) = limiter();

        for expected_remaining in (0..10).rev() {
            let decision = limiter.check_rate_limit("1.2.3.4", &config());
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let rejected = limiter.check_rate_limit("1.2.3.4", &config());
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
    }

    #[test]
    fn rejection_keeps_reset_time() {
        let (clock, limiter) = limiter();
        let first = limiter.check_rate_limit("a", &config());
        for _ in 0..9 {
            limiter.check_rate_limit("a", &config());
        }

        clock.advance(Duration::from_secs(30));
        let rejected = limiter.check_rate_limit("a", &config());
        assert!(!rejected.allowed);
        assert_eq!(rejected.reset_time, first.reset_time);
        assert_eq!(rejected.retry_after_secs(limiter.now()), 30);
    }

    #[test]
    fn window_resets_after_expiry() {
        let (clock, limiter) = limiter();
        for _ in 0..10 {
            assert!(limiter.check_rate_limit("a", &config()).allowed);
        }
        assert!(!limiter.check_rate_limit("a", &config()).allowed);

        // still inside the window at exactly reset_time
        clock.advance(Duration::from_secs(60));
        assert!(!limiter.check_rate_limit("a", &config()).allowed);

        clock.advance(Duration::from_millis(1));
        let decision = limiter.check_rate_limit("a", &config());
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 9);
    }

    #[test]
    fn identifiers_are_isolated() {
        let (_, limiter) = limiter();
        for _ in 0..10 {
            assert!(limiter.check_rate_limit("a", &config()).allowed);
            assert!(limiter.check_rate_limit("b", &config()).allowed);
        }
        assert!(!limiter.check_rate_limit("a", &config()).allowed);
        assert!(!limiter.check_rate_limit("b", &config()).allowed);
        assert_eq!(limiter.len(), 2);
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let (clock, limiter) = limiter();
        limiter.check_rate_limit("old", &config());

        clock.advance(Duration::from_secs(45));
        limiter.check_rate_limit("fresh", &config());

        assert_eq!(limiter.sweep_expired(), 0);

        clock.advance(Duration::from_secs(20));
        assert_eq!(limiter.sweep_expired(), 1);
        assert_eq!(limiter.len(), 1);

        // the surviving entry still carries its count
        let decision = limiter.check_rate_limit("fresh", &config());
        assert_eq!(decision.remaining, 8);
    }

    #[test]
    fn concurrent_requests_never_exceed_limit() {
        let limiter = Arc::new(RateLimiter::new());
        let cfg = RateLimitConfig {
            max_requests: 50,
            window: Duration::from_secs(60),
        };

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..25)
                        .filter(|_| limiter.check_rate_limit("shared", &cfg).allowed)
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
    }

    #[test]
    fn retry_after_rounds_up() {
        let now = Instant::now();
        let decision = RateLimitDecision {
            allowed: false,
            remaining: 0,
            reset_time: now + Duration::from_millis(1500),
        };
        assert_eq!(decision.retry_after_secs(now), 2);
        assert_eq!(decision.retry_after_secs(now + Duration::from_secs(5)), 1);
    }
}
