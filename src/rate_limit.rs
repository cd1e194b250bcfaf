//! Per-identity admission control over three sliding windows.
//!
//! Every identity owns a minute, hour and day window holding the timestamps of its
//! recorded requests. Stale timestamps are purged before any count is read, then the
//! windows are evaluated narrowest first so the most immediate constraint is reported.

use crate::clock::{Clock, SystemClock};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Sliding window horizons, narrowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitType {
    Minute,
    Hour,
    Day,
}

impl LimitType {
    /// Evaluation order used by `check`.
    pub const ALL: [LimitType; 3] = [LimitType::Minute, LimitType::Hour, LimitType::Day];

    pub fn horizon(self) -> Duration {
        match self {
            Self::Minute => Duration::from_secs(60),
            Self::Hour => Duration::from_secs(3_600),
            Self::Day => Duration::from_secs(86_400),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }

    fn horizon_millis(self) -> u64 {
        self.horizon().as_secs() * 1_000
    }

    // Unit used in the end-user message
    fn unit(self) -> &'static str {
        match self {
            Self::Minute => "minuto",
            Self::Hour => "hora",
            Self::Day => "día",
        }
    }
}

impl fmt::Display for LimitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request thresholds per window. Fixed once the limiter is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    pub minute: u32,
    pub hour: u32,
    pub day: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            minute: 5,
            hour: 30,
            day: 100,
        }
    }
}

impl RateLimits {
    pub fn threshold(&self, kind: LimitType) -> u32 {
        match kind {
            LimitType::Minute => self.minute,
            LimitType::Hour => self.hour,
            LimitType::Day => self.day,
        }
    }
}

/// Outcome of an admission check.
///
/// `reason`, `retry_after` and `limit_type` are present only when `allowed` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitDecision {
    pub allowed: bool,
    pub reason: Option<String>,
    /// Whole seconds until the oldest entry of the blocking window expires.
    /// Partial seconds round up, so a block right after recording reports the full
    /// horizon (60 for the minute window) rather than 59.
    pub retry_after: Option<u64>,
    pub limit_type: Option<LimitType>,
}

impl LimitDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            retry_after: None,
            limit_type: None,
        }
    }

    pub fn block(kind: LimitType, threshold: u32, retry_after: u64) -> Self {
        Self {
            allowed: false,
            reason: Some(format!(
                "Has alcanzado el límite de {} consultas por {}",
                threshold,
                kind.unit()
            )),
            retry_after: Some(retry_after),
            limit_type: Some(kind),
        }
    }
}

/// Current occupancy of an identity's windows alongside the configured limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    pub minute: usize,
    pub hour: usize,
    pub day: usize,
    pub limits: RateLimits,
}

// Timestamps (clock millis) of recorded requests, one queue per horizon
#[derive(Debug, Default)]
struct RequestWindow {
    minute: VecDeque<u64>,
    hour: VecDeque<u64>,
    day: VecDeque<u64>,
}

impl RequestWindow {
    fn entries(&self, kind: LimitType) -> &VecDeque<u64> {
        match kind {
            LimitType::Minute => &self.minute,
            LimitType::Hour => &self.hour,
            LimitType::Day => &self.day,
        }
    }

    // keep only timestamps strictly younger than their horizon
    fn purge(&mut self, now: u64) {
        for (queue, kind) in [
            (&mut self.minute, LimitType::Minute),
            (&mut self.hour, LimitType::Hour),
            (&mut self.day, LimitType::Day),
        ] {
            let horizon = kind.horizon_millis();
            queue.retain(|&ts| now.saturating_sub(ts) < horizon);
        }
    }

    fn push(&mut self, now: u64) {
        self.minute.push_back(now);
        self.hour.push_back(now);
        self.day.push_back(now);
    }

    fn is_empty(&self) -> bool {
        self.minute.is_empty() && self.hour.is_empty() && self.day.is_empty()
    }
}

// Seconds until the oldest timestamp leaves the window, rounded up and never negative
fn retry_after_secs(kind: LimitType, oldest: u64, now: u64) -> u64 {
    let age = now.saturating_sub(oldest);
    kind.horizon_millis().saturating_sub(age).div_ceil(1_000)
}

/// Admission contract the request handlers depend on.
///
/// `record` must only be called once a request was admitted and the downstream
/// work succeeded; the implementation does not enforce that ordering.
pub trait AdmissionControl: Send + Sync {
    fn check(&self, identity: &str) -> LimitDecision;
    fn record(&self, identity: &str);
    fn stats(&self, identity: &str) -> UsageStats;
    /// Drops identities whose windows are all empty. Returns how many were dropped.
    fn sweep(&self) -> usize;
    fn tracked_identities(&self) -> usize;
}

/// In-memory sliding window limiter.
///
/// Each identity lives in one shard of the map; holding that shard's guard for the whole
/// purge-evaluate or purge-append sequence serializes operations on the same identity
/// without a process-wide lock.
pub struct RateLimiter<C: Clock = SystemClock> {
    limits: RateLimits,
    clock: C,
    windows: DashMap<String, RequestWindow>,
}

impl RateLimiter<SystemClock> {
    pub fn new(limits: RateLimits) -> Self {
        Self::with_clock(limits, SystemClock::default())
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_clock(limits: RateLimits, clock: C) -> Self {
        Self {
            limits,
            clock,
            windows: DashMap::new(),
        }
    }
}

impl<C: Clock> AdmissionControl for RateLimiter<C> {
    fn check(&self, identity: &str) -> LimitDecision {
        let now = self.clock.now_millis();
        let mut window = self.windows.entry(identity.to_owned()).or_default();
        window.purge(now);

        for kind in LimitType::ALL {
            let threshold = self.limits.threshold(kind);
            let entries = window.entries(kind);
            if entries.len() >= threshold as usize {
                let oldest = entries.iter().copied().min().unwrap_or(now);
                let retry_after = retry_after_secs(kind, oldest, now);
                info!(
                    identity,
                    limit_type = %kind,
                    count = entries.len(),
                    threshold,
                    retry_after,
                    "Request blocked by rate limit"
                );
                return LimitDecision::block(kind, threshold, retry_after);
            }
        }

        debug!(identity, minute = window.minute.len(), "Request admitted");
        LimitDecision::allow()
    }

    fn record(&self, identity: &str) {
        let now = self.clock.now_millis();
        self.windows.entry(identity.to_owned()).or_default().push(now);
    }

    fn stats(&self, identity: &str) -> UsageStats {
        let now = self.clock.now_millis();
        // unknown identities read as zero without being tracked
        let (minute, hour, day) = match self.windows.get_mut(identity) {
            Some(mut window) => {
                window.purge(now);
                (window.minute.len(), window.hour.len(), window.day.len())
            }
            None => (0, 0, 0),
        };

        UsageStats {
            minute,
            hour,
            day,
            limits: self.limits,
        }
    }

    fn sweep(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            window.purge(now);
            !window.is_empty()
        });
        let removed = before.saturating_sub(self.windows.len());
        if removed > 0 {
            debug!(removed, remaining = self.windows.len(), "Swept idle identities");
        }
        removed
    }

    fn tracked_identities(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;

    fn limiter() -> (RateLimiter<Arc<ManualClock>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        clock.set_millis(1_000_000);
        (RateLimiter::with_clock(RateLimits::default(), clock.clone()), clock)
    }

    #[test]
    fn test_sixth_request_in_a_minute_is_blocked() {
        let (limiter, _) = limiter();

        for i in 0..5 {
            let decision = limiter.check("user-1");
            assert!(decision.allowed, "request {} should be admitted", i + 1);
            assert_eq!(decision.reason, None);
            assert_eq!(decision.retry_after, None);
            limiter.record("user-1");
        }

        let decision = limiter.check("user-1");
        assert!(!decision.allowed);
        assert_eq!(decision.limit_type, Some(LimitType::Minute));
        assert_eq!(
            decision.reason.as_deref(),
            Some("Has alcanzado el límite de 5 consultas por minuto")
        );
        assert_eq!(decision.retry_after, Some(60));
    }

    #[test]
    fn test_retry_after_counts_from_oldest_entry() {
        let (limiter, clock) = limiter();

        limiter.record("user-1");
        clock.advance(Duration::from_secs(10));
        for _ in 0..4 {
            limiter.record("user-1");
        }
        clock.advance(Duration::from_millis(15_500));

        let decision = limiter.check("user-1");
        // oldest entry is 25.5s old, 34.5s left rounds up to 35
        assert_eq!(decision.retry_after, Some(35));
    }

    #[test]
    fn test_minute_window_expires() {
        let (limiter, clock) = limiter();
        for _ in 0..5 {
            limiter.record("user-1");
        }
        assert!(!limiter.check("user-1").allowed);

        clock.advance(Duration::from_secs(60));
        assert!(limiter.check("user-1").allowed);

        let stats = limiter.stats("user-1");
        assert_eq!(stats.minute, 0);
        assert_eq!(stats.hour, 5);
        assert_eq!(stats.day, 5);
    }

    #[test]
    fn test_hour_limit_reported_after_minute_windows_clear() {
        let (limiter, clock) = limiter();

        for _ in 0..6 {
            for _ in 0..5 {
                limiter.record("user-1");
            }
            clock.advance(Duration::from_secs(61));
        }

        let decision = limiter.check("user-1");
        assert!(!decision.allowed);
        assert_eq!(decision.limit_type, Some(LimitType::Hour));
        assert_eq!(
            decision.reason.as_deref(),
            Some("Has alcanzado el límite de 30 consultas por hora")
        );
        // oldest entry is 366s old
        assert_eq!(decision.retry_after, Some(3_600 - 366));
    }

    #[test]
    fn test_day_limit_reported_after_hour_windows_clear() {
        let (limiter, clock) = limiter();

        for _ in 0..4 {
            for _ in 0..5 {
                for _ in 0..5 {
                    limiter.record("user-1");
                }
                clock.advance(Duration::from_secs(61));
            }
            clock.advance(Duration::from_secs(3_600));
        }

        let stats = limiter.stats("user-1");
        assert_eq!(stats.day, 100);
        assert_eq!(stats.hour, 0);

        let decision = limiter.check("user-1");
        assert_eq!(decision.limit_type, Some(LimitType::Day));
        let retry_after = decision.retry_after.unwrap();
        assert!(retry_after > 0 && retry_after <= 86_400);
    }

    #[test]
    fn test_narrowest_window_wins_when_several_are_full() {
        let clock = Arc::new(ManualClock::new());
        let limits = RateLimits {
            minute: 2,
            hour: 2,
            day: 2,
        };
        let limiter = RateLimiter::with_clock(limits, clock);
        limiter.record("user-1");
        limiter.record("user-1");

        let decision = limiter.check("user-1");
        assert_eq!(decision.limit_type, Some(LimitType::Minute));
    }

    #[test]
    fn test_purge_is_idempotent() {
        let (limiter, clock) = limiter();
        for _ in 0..3 {
            limiter.record("user-1");
            clock.advance(Duration::from_secs(25));
        }

        let first = limiter.stats("user-1");
        let second = limiter.stats("user-1");
        assert_eq!(first, second);
        assert_eq!(first.minute, 2);

        limiter.check("user-1");
        assert_eq!(limiter.stats("user-1"), first);
    }

    #[test]
    fn test_record_increments_every_window() {
        let (limiter, _) = limiter();
        limiter.record("user-1");

        let stats = limiter.stats("user-1");
        assert_eq!((stats.minute, stats.hour, stats.day), (1, 1, 1));
        assert_eq!(stats.limits, RateLimits::default());
    }

    #[test]
    fn test_blocked_check_does_not_touch_counts() {
        let (limiter, _) = limiter();
        for _ in 0..5 {
            limiter.record("user-1");
        }
        for _ in 0..3 {
            assert!(!limiter.check("user-1").allowed);
        }

        let stats = limiter.stats("user-1");
        assert_eq!((stats.minute, stats.hour, stats.day), (5, 5, 5));
    }

    #[test]
    fn test_identities_are_independent() {
        let (limiter, _) = limiter();
        for _ in 0..5 {
            limiter.record("user-1");
        }

        assert!(!limiter.check("user-1").allowed);
        assert!(limiter.check("user-2").allowed);
    }

    #[test]
    fn test_retry_after_never_negative_or_past_horizon() {
        assert_eq!(retry_after_secs(LimitType::Minute, 0, 60_000), 0);
        assert_eq!(retry_after_secs(LimitType::Minute, 0, 500_000), 0);
        // timestamp ahead of the clock
        assert_eq!(retry_after_secs(LimitType::Minute, 10_000, 5_000), 60);
        assert_eq!(retry_after_secs(LimitType::Day, 0, 1), 86_400);
    }

    #[test]
    fn test_sweep_evicts_only_idle_identities() {
        let (limiter, clock) = limiter();
        limiter.record("old");
        limiter.check("seen-only");
        clock.advance(Duration::from_secs(86_400));
        limiter.record("fresh");

        assert_eq!(limiter.tracked_identities(), 3);
        assert_eq!(limiter.sweep(), 2);
        assert_eq!(limiter.tracked_identities(), 1);
        assert_eq!(limiter.stats("fresh").day, 1);
    }

    #[test]
    fn test_stats_for_unknown_identity_is_not_tracked() {
        let (limiter, _) = limiter();

        let stats = limiter.stats("nobody");
        assert_eq!((stats.minute, stats.hour, stats.day), (0, 0, 0));
        assert_eq!(stats.limits, RateLimits::default());
        assert_eq!(limiter.tracked_identities(), 0);
    }

    #[test]
    fn test_concurrent_check_and_record_do_not_lose_updates() {
        let clock = Arc::new(ManualClock::new());
        let limits = RateLimits {
            minute: 1_000,
            hour: 1_000,
            day: 1_000,
        };
        let limiter = Arc::new(RateLimiter::with_clock(limits, clock));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    let mut admitted = 0usize;
                    for _ in 0..50 {
                        if limiter.check("shared").allowed {
                            limiter.record("shared");
                            admitted += 1;
                        }
                    }
                    admitted
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        let stats = limiter.stats("shared");
        assert_eq!(admitted, 400);
        assert_eq!(stats.minute, admitted);
        assert_eq!(stats.day, admitted);
    }
}
