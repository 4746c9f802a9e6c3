//! Client-side rate limiting for content-creating API calls.
//!
//! Two resource classes (issue-creating and comment-creating calls) are
//! each gated by a fixed-length per-minute and per-hour window. Windows
//! are not sliding: a window's count drops to zero the moment the window
//! length has elapsed since it started. Counters live in memory only and
//! reset on restart; the caps are sized so a restarted process still
//! stays under GitHub's server-side limits in the common case.

use tokio::time::{sleep, Duration, Instant};

use crate::config::RateLimits;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    Issue,
    Comment,
}

impl std::fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceClass::Issue => write!(f, "issue"),
            ResourceClass::Comment => write!(f, "comment"),
        }
    }
}

/// Admit a little below the hard cap to absorb clock skew and in-flight
/// latency against the remote's own accounting.
fn soft_limit(cap: u32) -> u32 {
    (cap - cap / 10).max(1)
}

#[derive(Debug)]
struct RateWindow {
    count: u32,
    started: Instant,
    length: Duration,
    soft_limit: u32,
}

impl RateWindow {
    fn new(cap: u32, length: Duration, now: Instant) -> Self {
        Self {
            count: 0,
            started: now,
            length,
            soft_limit: soft_limit(cap),
        }
    }

    fn roll(&mut self, now: Instant) {
        if now.duration_since(self.started) >= self.length {
            self.count = 0;
            self.started = now;
        }
    }

    /// Time left until this window's boundary, if the soft limit has been
    /// reached; `None` when a call may proceed.
    fn wait_needed(&mut self, now: Instant) -> Option<Duration> {
        self.roll(now);
        if self.count >= self.soft_limit {
            Some(self.length - now.duration_since(self.started))
        } else {
            None
        }
    }

    fn record(&mut self, now: Instant) {
        self.roll(now);
        self.count += 1;
    }
}

#[derive(Debug)]
struct ClassWindows {
    minute: RateWindow,
    hour: RateWindow,
}

impl ClassWindows {
    fn new(per_minute: u32, per_hour: u32, now: Instant) -> Self {
        Self {
            minute: RateWindow::new(per_minute, MINUTE, now),
            hour: RateWindow::new(per_hour, HOUR, now),
        }
    }

    fn wait_needed(&mut self, now: Instant) -> Option<Duration> {
        self.minute.wait_needed(now).or(self.hour.wait_needed(now))
    }

    fn record(&mut self, now: Instant) {
        self.minute.record(now);
        self.hour.record(now);
    }
}

/// Owns the four window counters. Plain value, not shared: the
/// orchestrator is single-threaded and calls are served strictly in
/// request order.
pub struct RateLimiter {
    issue: ClassWindows,
    comment: ClassWindows,
    call_spacing: Duration,
}

impl RateLimiter {
    pub fn new(limits: &RateLimits) -> Self {
        let now = Instant::now();
        Self {
            issue: ClassWindows::new(limits.issues_per_minute, limits.issues_per_hour, now),
            comment: ClassWindows::new(limits.comments_per_minute, limits.comments_per_hour, now),
            call_spacing: limits.call_spacing,
        }
    }

    /// Blocks until it is safe to perform one call of the given class,
    /// then counts the call against both of its windows.
    pub async fn admit(&mut self, class: ResourceClass) {
        loop {
            let now = Instant::now();
            match self.windows_mut(class).wait_needed(now) {
                Some(wait) => {
                    tracing::info!(
                        "{} window full, waiting {}s for the next boundary",
                        class,
                        wait.as_secs()
                    );
                    sleep(wait).await;
                }
                None => break,
            }
        }

        if !self.call_spacing.is_zero() {
            sleep(self.call_spacing).await;
        }

        let now = Instant::now();
        self.windows_mut(class).record(now);
    }

    /// Current (minute, hour) counts for progress logging.
    pub fn counts(&mut self, class: ResourceClass) -> (u32, u32) {
        let now = Instant::now();
        let windows = self.windows_mut(class);
        windows.minute.roll(now);
        windows.hour.roll(now);
        (windows.minute.count, windows.hour.count)
    }

    fn windows_mut(&mut self, class: ResourceClass) -> &mut ClassWindows {
        match class {
            ResourceClass::Issue => &mut self.issue,
            ResourceClass::Comment => &mut self.comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_limit_sits_below_cap() {
        assert_eq!(soft_limit(20), 18);
        assert_eq!(soft_limit(150), 135);
        assert_eq!(soft_limit(1), 1);
    }

    #[test]
    fn test_window_blocks_at_soft_limit() {
        let start = Instant::now();
        let mut window = RateWindow::new(20, MINUTE, start);

        for _ in 0..17 {
            assert!(window.wait_needed(start).is_none());
            window.record(start);
        }
        window.record(start); // 18th call reaches the soft limit

        let wait = window.wait_needed(start + Duration::from_secs(10));
        assert_eq!(wait, Some(Duration::from_secs(50)));
    }

    #[test]
    fn test_window_resets_at_boundary() {
        let start = Instant::now();
        let mut window = RateWindow::new(20, MINUTE, start);
        for _ in 0..18 {
            window.record(start);
        }
        assert!(window.wait_needed(start).is_some());

        // The moment the window length has elapsed, the count is gone.
        let later = start + MINUTE;
        assert!(window.wait_needed(later).is_none());
        assert_eq!(window.count, 0);
    }

    #[test]
    fn test_count_never_exceeds_cap_within_window() {
        let start = Instant::now();
        let mut window = RateWindow::new(20, MINUTE, start);
        let mut admitted = 0;

        // Simulate a minute of admission attempts at one-second spacing.
        for s in 0..60 {
            let now = start + Duration::from_secs(s);
            if window.wait_needed(now).is_none() {
                window.record(now);
                admitted += 1;
            }
        }
        assert!(admitted <= 20);
        assert!(window.count <= 20);
    }

    #[test]
    fn test_hour_window_holds_after_minute_reset() {
        let limits = RateLimits {
            issues_per_minute: 20,
            issues_per_hour: 30,
            ..RateLimits::default()
        };
        let start = Instant::now();
        let mut windows = ClassWindows::new(limits.issues_per_minute, limits.issues_per_hour, start);

        // Fill the hour window (soft limit 27) across several minutes.
        for i in 0..27 {
            let now = start + Duration::from_secs(i * 120);
            assert!(windows.wait_needed(now).is_none(), "call {} blocked", i);
            windows.record(now);
        }

        // The minute window has long since rolled, but the hour window
        // still refuses until its boundary.
        let after = start + Duration::from_secs(26 * 120 + 1);
        assert!(windows.wait_needed(after).is_some());
    }

    #[tokio::test]
    async fn test_admit_returns_below_thresholds() {
        let limits = RateLimits {
            call_spacing: Duration::ZERO,
            ..RateLimits::default()
        };
        let mut limiter = RateLimiter::new(&limits);
        limiter.admit(ResourceClass::Issue).await;
        limiter.admit(ResourceClass::Comment).await;
        assert_eq!(limiter.counts(ResourceClass::Issue), (1, 1));
        assert_eq!(limiter.counts(ResourceClass::Comment), (1, 1));
    }
}
