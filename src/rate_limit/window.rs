use super::types::{RateLimitConfig, RateLimitResult};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const INITIAL_CAPACITY_CAP: usize = 4096;

/// Process-wide admission controller counting admissions in a trailing window.
///
/// Every admitted request is logged as an [`Instant`]. On each check, entries
/// at least one window old are discarded and the remainder counted, so the
/// count is exact rather than estimated. Limits are global: there is no
/// per-client partitioning and every request weighs the same.
///
/// The prune/count/append sequence runs under a single mutex, so two callers
/// can never both take the last free slot. The lock is never held across an
/// `.await`.
#[derive(Debug)]
pub struct RateLimiter {
    /// Admission log, oldest first
    admissions: Mutex<VecDeque<Instant>>,
    /// Maximum admissions inside one window
    max_requests: u32,
    /// Trailing window length
    window: Duration,
}

impl RateLimiter {
    /// Create a limiter admitting at most `max_requests` per `window`
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            admissions: Mutex::new(VecDeque::with_capacity(
                (max_requests as usize).min(INITIAL_CAPACITY_CAP),
            )),
            max_requests,
            window,
        }
    }

    /// Create a limiter from configuration
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests, config.window())
    }

    /// Admit or reject a request arriving at `now`; records `now` on success.
    pub fn try_admit(&self, now: Instant) -> bool {
        self.check(now).allowed
    }

    /// Same as [`try_admit`](Self::try_admit) but reports the window state as well
    pub fn check(&self, now: Instant) -> RateLimitResult {
        let mut admissions = self.lock();
        self.prune(&mut admissions, now);

        let count = admissions.len();
        if count >= self.max_requests as usize {
            let retry_after = admissions
                .front()
                .map(|oldest| self.expires_in(*oldest, now))
                .unwrap_or(0)
                .max(1);

            warn!(
                in_window = count,
                limit = self.max_requests,
                retry_after,
                "Rate limit exceeded"
            );
            return RateLimitResult::denied(self.max_requests, retry_after);
        }

        // Callers sample the clock before taking the lock, so a slightly
        // older instant may arrive after a newer one. Clamp to keep the log sorted.
        let stamp = admissions.back().map_or(now, |last| (*last).max(now));
        admissions.push_back(stamp);

        let remaining = self.max_requests - admissions.len() as u32;
        let reset_after = admissions
            .front()
            .map(|oldest| self.expires_in(*oldest, now))
            .unwrap_or(0);

        debug!(remaining, "Rate limit check passed");
        RateLimitResult::allowed(remaining, self.max_requests, reset_after)
    }

    /// Number of admissions still inside the window at `now`
    pub fn in_window(&self, now: Instant) -> usize {
        let mut admissions = self.lock();
        self.prune(&mut admissions, now);
        admissions.len()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        // Every critical section leaves the log sorted, so a poisoned guard is still usable.
        self.admissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn prune(&self, admissions: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = admissions.front() {
            if now.saturating_duration_since(*oldest) < self.window {
                break;
            }
            admissions.pop_front();
        }
    }

    /// Whole seconds, rounded up, until an admission at `at` leaves the window
    fn expires_in(&self, at: Instant, now: Instant) -> u64 {
        let remaining = (at + self.window).saturating_duration_since(now);
        let secs = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}
