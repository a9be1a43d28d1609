// ABOUTME: Integration tests for poll cadence and the poll scheduler.
// ABOUTME: Includes a property test for the grace window after activity ends.

use kahu::config::PollingConfig;
use kahu::poll::*;
use kahu::types::ViewScope;
use proptest::prelude::*;
use std::time::Duration;
use tokio::time::Instant;

const ACTIVE: Activity = Activity {
    active: true,
    provisioning: false,
};
const IDLE: Activity = Activity {
    active: false,
    provisioning: false,
};

mod cadence {
    use super::*;

    #[test]
    fn default_intervals() {
        let config = PollingConfig::default();
        let detail = CadencePolicy::for_scope(&config, ViewScope::Detail);
        let list = CadencePolicy::for_scope(&config, ViewScope::List);

        assert_eq!(detail.fast, Duration::from_millis(2500));
        assert_eq!(list.fast, Duration::from_secs(5));
        assert_eq!(detail.slow, Duration::from_secs(20));
        assert_eq!(list.slow, Duration::from_secs(20));
        assert_eq!(detail.provisioning, Duration::from_secs(5));
        assert_eq!(detail.grace, Duration::from_secs(30));
    }

    #[test]
    fn never_active_is_slow() {
        let policy = CadencePolicy::default();
        let tracker = ActivityTracker::default();
        assert_eq!(policy.cadence(&tracker, Instant::now()), Cadence::Slow);
    }

    #[test]
    fn active_is_fast() {
        let policy = CadencePolicy::default();
        let mut tracker = ActivityTracker::default();
        let now = Instant::now();
        assert!(tracker.observe(ACTIVE, now));
        assert_eq!(policy.cadence(&tracker, now), Cadence::Fast);
    }

    #[test]
    fn provisioning_uses_its_own_tier() {
        let policy = CadencePolicy::default();
        let mut tracker = ActivityTracker::default();
        let now = Instant::now();
        tracker.observe(
            Activity {
                active: false,
                provisioning: true,
            },
            now,
        );
        assert_eq!(policy.cadence(&tracker, now), Cadence::Provisioning);
        assert_eq!(
            policy.interval(Cadence::Provisioning),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn activity_overrides_provisioning() {
        let policy = CadencePolicy::default();
        let mut tracker = ActivityTracker::default();
        let now = Instant::now();
        tracker.observe(
            Activity {
                active: true,
                provisioning: true,
            },
            now,
        );
        assert_eq!(policy.cadence(&tracker, now), Cadence::Fast);
    }

    #[test]
    fn repeated_idle_signals_do_not_extend_grace() {
        let policy = CadencePolicy::default();
        let mut tracker = ActivityTracker::default();
        let start = Instant::now();
        tracker.observe(ACTIVE, start);
        tracker.observe(IDLE, start + Duration::from_secs(1));
        assert!(!tracker.observe(IDLE, start + Duration::from_secs(20)));

        assert_eq!(tracker.went_idle_at(), Some(start + Duration::from_secs(1)));
        assert_eq!(
            policy.cadence(&tracker, start + Duration::from_secs(31)),
            Cadence::Slow
        );
    }

    proptest! {
        #[test]
        fn grace_window_keeps_fast_cadence(
            active_for in 0u64..600_000,
            offset in 0u64..120_000,
        ) {
            let policy = CadencePolicy::default();
            let mut tracker = ActivityTracker::default();
            let start = Instant::now();
            let idle_at = start + Duration::from_millis(active_for);
            tracker.observe(ACTIVE, start);
            tracker.observe(IDLE, idle_at);

            let now = idle_at + Duration::from_millis(offset);
            let expected = if Duration::from_millis(offset) < policy.grace {
                Cadence::Fast
            } else {
                Cadence::Slow
            };
            prop_assert_eq!(policy.cadence(&tracker, now), expected);
        }
    }
}

mod scheduler {
    use super::*;

    #[test]
    fn start_arms_one_interval_ahead() {
        let mut scheduler = PollScheduler::new(CadencePolicy::default());
        let now = Instant::now();
        assert!(!scheduler.is_running());

        scheduler.start(now);
        assert_eq!(scheduler.deadline(), Some(now + Duration::from_secs(20)));

        scheduler.start(now + Duration::from_secs(5));
        assert_eq!(
            scheduler.deadline(),
            Some(now + Duration::from_secs(20)),
            "starting twice keeps one timer"
        );
    }

    #[test]
    fn rising_activity_pulls_deadline_in() {
        let mut scheduler = PollScheduler::new(CadencePolicy::default());
        let now = Instant::now();
        scheduler.start(now);

        let later = now + Duration::from_secs(3);
        scheduler.observe(ACTIVE, later);
        assert_eq!(
            scheduler.deadline(),
            Some(later + Duration::from_millis(2500))
        );
    }

    #[test]
    fn falling_activity_keeps_pending_deadline() {
        let mut scheduler = PollScheduler::new(CadencePolicy::default());
        let now = Instant::now();
        scheduler.observe(ACTIVE, now);
        scheduler.start(now);
        assert_eq!(scheduler.deadline(), Some(now + Duration::from_millis(2500)));

        scheduler.observe(IDLE, now + Duration::from_secs(1));
        assert_eq!(scheduler.deadline(), Some(now + Duration::from_millis(2500)));
    }

    #[test]
    fn fire_rearms_with_current_cadence() {
        let mut scheduler = PollScheduler::new(CadencePolicy::default());
        let start = Instant::now();
        scheduler.observe(ACTIVE, start);
        scheduler.observe(IDLE, start);
        scheduler.start(start);

        let within_grace = start + Duration::from_secs(10);
        assert!(scheduler.fire(within_grace));
        assert_eq!(
            scheduler.deadline(),
            Some(within_grace + Duration::from_millis(2500))
        );

        let after_grace = start + Duration::from_secs(40);
        assert!(scheduler.fire(after_grace));
        assert_eq!(
            scheduler.deadline(),
            Some(after_grace + Duration::from_secs(20))
        );
    }

    #[test]
    fn stopped_scheduler_never_fires() {
        let mut scheduler = PollScheduler::new(CadencePolicy::default());
        let now = Instant::now();
        scheduler.start(now);
        scheduler.stop();

        assert!(!scheduler.is_running());
        assert!(scheduler.deadline().is_none());
        assert!(!scheduler.fire(now + Duration::from_secs(60)));
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn tick_resolves_at_deadline() {
        let mut scheduler = PollScheduler::new(CadencePolicy::default());
        let start = Instant::now();
        scheduler.start(start);

        scheduler.tick().await;
        assert_eq!(Instant::now() - start, Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn tick_pends_while_stopped() {
        let scheduler = PollScheduler::new(CadencePolicy::default());
        let result = tokio::time::timeout(Duration::from_secs(3600), scheduler.tick()).await;
        assert!(result.is_err());
    }
}

#[test]
fn at_most_two_fetches_in_flight() {
    assert_eq!(MAX_IN_FLIGHT_FETCHES, 2);
}
