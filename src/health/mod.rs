//! Fixed-backoff resource health policy, a per-resource failure detector
//! used by the cluster map to mark data nodes and disks "down" when errors
//! cluster, and to automatically reopen them after a backoff.
//!
//! # Concurrency
//!
//! `on_error` serialises through a per-resource [`std::sync::Mutex`]; the
//! overwhelmingly common `is_down` call is a single atomic load on the
//! healthy path and only takes the lock when the resource is currently
//! down, to check whether the backoff has expired. Switching either
//! operation to pure-atomic or pure-locked changes contention behaviour
//! observably under load, the dual-check pattern is required, not
//! incidental.

mod wrappers;

pub use wrappers::{DataNodeHealth, DiskHealth, ResourceAvailability};

use crate::clock::{Clock, SystemClock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Immutable tuning for a [`HealthPolicy`] instance.
#[derive(Debug, Clone, Copy)]
pub struct HealthPolicyConfig {
    /// Sliding window, in milliseconds, over which failures are counted.
    pub failure_window_ms: u64,
    /// Number of failures within the window that trips the resource down.
    pub threshold: usize,
    /// How long, in milliseconds, a tripped resource stays down before the
    /// next `is_down()` call is allowed to reopen it.
    pub retry_backoff_ms: u64,
}

impl HealthPolicyConfig {
    pub fn new(failure_window_ms: u64, threshold: usize, retry_backoff_ms: u64) -> Self {
        Self { failure_window_ms, threshold, retry_backoff_ms }
    }
}

/// Lock-protected failure-window state. Separated from the atomics so the
/// fast path of `is_down` never has to touch it.
struct WindowState {
    failures: VecDeque<u64>,
}

/// Per-resource failure counter and soft/hard down state machine.
///
/// `hard_down` is fixed at construction and, when set, makes `is_down()`
/// always return `true`, no transition ever clears it.
/// The clock is a shared, injectable [`Clock`], `HealthPolicy`'s only
/// external dependency.
pub struct HealthPolicy {
    resource_id: String,
    config: HealthPolicyConfig,
    hard_down: bool,
    down: AtomicBool,
    down_until: AtomicU64,
    window: Mutex<WindowState>,
    clock: Arc<dyn Clock>,
}

impl HealthPolicy {
    /// Construct with the default wall-clock [`SystemClock`].
    pub fn new(resource_id: impl Into<String>, config: HealthPolicyConfig) -> Self {
        Self::with_clock(resource_id, config, Arc::new(SystemClock::new()))
    }

    /// Construct with an injected clock, letting deterministic scenario
    /// tests drive this with a [`crate::clock::ManualClock`].
    pub fn with_clock(
        resource_id: impl Into<String>,
        config: HealthPolicyConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new_inner(resource_id, config, clock, false)
    }

    /// Construct a permanently down resource. No transition ever clears it.
    pub fn hard_down(resource_id: impl Into<String>, config: HealthPolicyConfig) -> Self {
        Self::new_inner(resource_id, config, Arc::new(SystemClock::new()), true)
    }

    fn new_inner(
        resource_id: impl Into<String>,
        config: HealthPolicyConfig,
        clock: Arc<dyn Clock>,
        hard_down: bool,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            config,
            hard_down,
            down: AtomicBool::new(false),
            down_until: AtomicU64::new(0),
            window: Mutex::new(WindowState { failures: VecDeque::with_capacity(config.threshold) }),
            clock,
        }
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// Fixed at construction; once `true`, nothing ever clears it.
    pub fn is_hard_down(&self) -> bool {
        self.hard_down
    }

    /// Record a failure observed at `clock.now_ms()`.
    ///
    /// 1. If already down, the error is absorbed, no queue mutation.
    /// 2. Evict timestamps older than `now - failure_window_ms`.
    /// 3. If still below threshold, append `now`.
    /// 4. Otherwise clear the window, trip `down`, set the backoff
    ///    deadline, and log the transition.
    pub fn on_error(&self) {
        if self.hard_down {
            return;
        }
        // Already down: absorb without touching the window.
        if self.down.load(Ordering::Acquire) {
            return;
        }

        let now = self.clock.now_ms();
        let mut state = self.window.lock().unwrap_or_else(|e| e.into_inner());

        let cutoff = now.saturating_sub(self.config.failure_window_ms);
        while matches!(state.failures.front(), Some(&t) if t < cutoff) {
            state.failures.pop_front();
        }

        // Recording `now` would bring the window to `threshold` failures,
        // trip instead of appending: with threshold=3 this trips on the
        // 3rd call, not the 4th, so the check is against the count
        // *including* the failure being recorded.
        if state.failures.len() + 1 < self.config.threshold {
            state.failures.push_back(now);
            return;
        }

        state.failures.clear();
        drop(state);

        self.down_until.store(now + self.config.retry_backoff_ms, Ordering::Relaxed);
        self.down.store(true, Ordering::Release);
        log::warn!("resource {} went down", self.resource_id);
    }

    /// Hot path: if `hard_down`, always `true`. Otherwise an atomic load
    /// when healthy (no lock), falling through to the lock only to check
    /// whether the backoff has expired.
    pub fn is_down(&self) -> bool {
        if self.hard_down {
            return true;
        }
        if !self.down.load(Ordering::Acquire) {
            return false;
        }

        // Slow path: serialise the single "time to reopen" check. Two
        // concurrent callers may both reach here after expiry; exactly one
        // observes `down == true` and clears it, the other observes the
        // already-cleared state, both correctly return `false`.
        let _state = self.window.lock().unwrap_or_else(|e| e.into_inner());
        let now = self.clock.now_ms();
        if now > self.down_until.load(Ordering::Relaxed) {
            self.down.store(false, Ordering::Release);
            false
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;

    fn policy_with(clock: Arc<ManualClock>, window_ms: u64, threshold: usize, backoff_ms: u64) -> HealthPolicy {
        HealthPolicy::with_clock("test-resource", HealthPolicyConfig::new(window_ms, threshold, backoff_ms), clock)
    }

    /// window=1000ms, threshold=3, backoff=500ms.
    /// on_error at t=0,100,200 trips down; down at t=400; recovered at t=701.
    #[test]
    fn trips_down_then_recovers_after_backoff_elapses() {
        let clock = Arc::new(ManualClock::new(0));
        let p = policy_with(Arc::clone(&clock), 1000, 3, 500);

        p.on_error(); // t=0
        clock.set(100);
        p.on_error(); // t=100
        clock.set(200);
        p.on_error(); // t=200, reaches threshold
        assert!(p.is_down());

        clock.set(400);
        assert!(p.is_down());

        clock.set(701);
        assert!(!p.is_down());
    }

    /// on_error at t=0,500,999, all within the 1000ms window, so no
    /// eviction occurs and the third call trips down.
    #[test]
    fn trips_down_when_all_failures_stay_within_window() {
        let clock = Arc::new(ManualClock::new(0));
        let p = policy_with(Arc::clone(&clock), 1000, 3, 500);

        p.on_error(); // t=0
        clock.set(500);
        p.on_error(); // t=500
        clock.set(999);
        p.on_error(); // t=999, all three within window -> down
        assert!(p.is_down());
    }

    /// Timestamps 0, 500, 1001: by the third call the first timestamp
    /// (age 1001ms) has aged out of the 1000ms window, so the count after
    /// eviction+append is 2, below threshold.
    #[test]
    fn eviction_keeps_count_below_threshold() {
        let clock = Arc::new(ManualClock::new(0));
        let p = policy_with(Arc::clone(&clock), 1000, 3, 500);

        p.on_error(); // t=0
        clock.set(500);
        p.on_error(); // t=500
        clock.set(1001);
        p.on_error(); // t=0 evicted (age 1001 > 1000), count becomes 1 then 2
        assert!(!p.is_down());
    }

    #[test]
    fn errors_absorbed_once_down_no_queue_mutation() {
        let clock = Arc::new(ManualClock::new(0));
        let p = policy_with(Arc::clone(&clock), 1000, 2, 500);

        p.on_error();
        clock.set(10);
        p.on_error(); // trips down
        assert!(p.is_down());

        // Further errors while down must not mutate the window or extend
        // the backoff deadline (which was set relative to t=10, not t=20).
        clock.set(20);
        p.on_error();
        clock.set(511);
        assert!(!p.is_down(), "backoff should expire at the original deadline, unaffected by absorbed errors");
    }

    #[test]
    fn hard_down_is_terminal() {
        let clock = Arc::new(ManualClock::new(0));
        let cfg = HealthPolicyConfig::new(1000, 3, 500);
        let p = HealthPolicy::hard_down("r1", cfg);
        let _ = clock; // hard_down never consults the clock
        assert!(p.is_down());
        assert!(p.is_hard_down());
        p.on_error();
        assert!(p.is_down());
    }

    #[test]
    fn is_down_fast_path_survives_concurrent_readers_and_a_writer() {
        use std::thread;

        let cfg = HealthPolicyConfig::new(1000, 3, 500);
        let p = Arc::new(HealthPolicy::new("r1", cfg));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let p = Arc::clone(&p);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    let _ = p.is_down();
                }
            }));
        }
        let writer = {
            let p = Arc::clone(&p);
            thread::spawn(move || {
                for _ in 0..100 {
                    p.on_error();
                }
            })
        };
        for h in handles {
            h.join().unwrap();
        }
        writer.join().unwrap();
    }
}
