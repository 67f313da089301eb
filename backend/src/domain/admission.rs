//! Request admission: per-client rate windows and the agent blocklist.
//!
//! Each (client IP, route group) pair gets a fixed-window counter: a
//! window grants the group's full quota, the counter drains it, and the
//! window resets once its period elapses.
//! Counter updates happen under one mutex so concurrent bursts never
//! undercount. The clock is injected so tests can drive window expiry.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use mockable::Clock;

/// Declared client agents matching any of these substrings are rejected
/// outright, independent of the rate counters.
const BLOCKED_AGENT_PATTERNS: &[&str] = &["bot", "crawler", "spider"];

/// Window-map size that triggers a sweep of expired entries.
const SWEEP_THRESHOLD: usize = 10_000;

/// Logical route groups with independent quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteGroup {
    /// Everything not covered by a dedicated group.
    General,
    /// `POST /users`.
    UserCreation,
    /// `POST /scores/new/...`.
    ScoreSubmission,
}

impl RouteGroup {
    /// Requests admitted per window.
    pub fn quota(self) -> u32 {
        match self {
            Self::General => 300,
            Self::UserCreation => 5,
            Self::ScoreSubmission => 100,
        }
    }

    /// Window length.
    pub fn window(self) -> Duration {
        match self {
            Self::General => Duration::minutes(5),
            Self::UserCreation | Self::ScoreSubmission => Duration::hours(1),
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Let the request through.
    Admitted,
    /// Quota exhausted for this window.
    Throttled,
    /// Client agent is blocklisted.
    Blocked,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: DateTime<Utc>,
    count: u32,
}

/// Whether a declared client agent matches a known-automation pattern.
pub fn agent_is_blocked(agent: Option<&str>) -> bool {
    agent.is_some_and(|value| {
        let lowered = value.to_ascii_lowercase();
        BLOCKED_AGENT_PATTERNS
            .iter()
            .any(|pattern| lowered.contains(pattern))
    })
}

/// Per-(IP, route group) admission gate.
pub struct AdmissionController {
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<(IpAddr, RouteGroup), Window>>,
}

impl AdmissionController {
    /// Build a controller around a clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Check one request. Increments the counter atomically; a decision is
    /// reached before the request can touch ingestion or ranking.
    pub fn check(&self, ip: IpAddr, agent: Option<&str>, group: RouteGroup) -> Decision {
        if agent_is_blocked(agent) {
            return Decision::Blocked;
        }

        let now = self.clock.utc();
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        if windows.len() >= SWEEP_THRESHOLD {
            windows.retain(|(_, g), w| now - w.started_at < g.window());
        }

        let window = windows.entry((ip, group)).or_insert(Window {
            started_at: now,
            count: 0,
        });
        if now - window.started_at >= group.window() {
            window.started_at = now;
            window.count = 0;
        }
        window.count = window.count.saturating_add(1);
        if window.count > group.quota() {
            Decision::Throttled
        } else {
            Decision::Admitted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockable::MockClock;
    use rstest::rstest;
    use std::net::Ipv4Addr;

    fn fixed_clock(at: DateTime<Utc>) -> Arc<dyn Clock> {
        let mut clock = MockClock::new();
        clock.expect_utc().return_const(at);
        Arc::new(clock)
    }

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid")
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn sixth_user_creation_in_the_window_is_throttled() {
        let controller = AdmissionController::new(fixed_clock(epoch()));
        for _ in 0..5 {
            assert_eq!(
                controller.check(ip(1), None, RouteGroup::UserCreation),
                Decision::Admitted
            );
        }
        assert_eq!(
            controller.check(ip(1), None, RouteGroup::UserCreation),
            Decision::Throttled
        );
    }

    #[test]
    fn quotas_are_tracked_per_ip() {
        let controller = AdmissionController::new(fixed_clock(epoch()));
        for _ in 0..5 {
            controller.check(ip(1), None, RouteGroup::UserCreation);
        }
        assert_eq!(
            controller.check(ip(2), None, RouteGroup::UserCreation),
            Decision::Admitted
        );
    }

    #[test]
    fn quotas_are_tracked_per_route_group() {
        let controller = AdmissionController::new(fixed_clock(epoch()));
        for _ in 0..5 {
            controller.check(ip(1), None, RouteGroup::UserCreation);
        }
        // Exhausting user creation leaves the other groups untouched.
        assert_eq!(
            controller.check(ip(1), None, RouteGroup::ScoreSubmission),
            Decision::Admitted
        );
        assert_eq!(
            controller.check(ip(1), None, RouteGroup::General),
            Decision::Admitted
        );
    }

    #[test]
    fn window_expiry_resets_the_counter() {
        let mut clock = MockClock::new();
        let mut calls = 0u32;
        clock.expect_utc().returning(move || {
            calls += 1;
            // Calls 1-6 happen at the epoch; later calls one hour later.
            if calls <= 6 {
                epoch()
            } else {
                epoch() + Duration::hours(1)
            }
        });
        let controller = AdmissionController::new(Arc::new(clock));
        for _ in 0..5 {
            controller.check(ip(1), None, RouteGroup::UserCreation);
        }
        assert_eq!(
            controller.check(ip(1), None, RouteGroup::UserCreation),
            Decision::Throttled
        );
        assert_eq!(
            controller.check(ip(1), None, RouteGroup::UserCreation),
            Decision::Admitted
        );
    }

    #[rstest]
    #[case(Some("Googlebot/2.1"), true)]
    #[case(Some("my-BOT"), true)]
    #[case(Some("friendly spider"), true)]
    #[case(Some("data-crawler/1.0"), true)]
    #[case(Some("Mozilla/5.0"), false)]
    #[case(None, false)]
    fn agent_blocklist(#[case] agent: Option<&str>, #[case] blocked: bool) {
        assert_eq!(agent_is_blocked(agent), blocked);
    }

    #[test]
    fn blocked_agents_bypass_the_counters() {
        let controller = AdmissionController::new(fixed_clock(epoch()));
        assert_eq!(
            controller.check(ip(1), Some("bot"), RouteGroup::General),
            Decision::Blocked
        );
        // The blocked request consumed no quota.
        assert_eq!(
            controller.check(ip(1), None, RouteGroup::General),
            Decision::Admitted
        );
    }

    #[rstest]
    #[case(RouteGroup::General, 300)]
    #[case(RouteGroup::UserCreation, 5)]
    #[case(RouteGroup::ScoreSubmission, 100)]
    fn quotas_match_the_admission_contract(#[case] group: RouteGroup, #[case] quota: u32) {
        assert_eq!(group.quota(), quota);
    }
}
