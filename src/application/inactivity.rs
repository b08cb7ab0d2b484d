// Inactivity monitor - Reverts a paused view to live after idling
use crate::application::widget::SharedWidgetState;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_INACTIVITY_THRESHOLD: Duration = Duration::seconds(60);

#[derive(Debug, Clone, Copy)]
pub struct InactivityMonitor {
    threshold: Duration,
}

impl Default for InactivityMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_INACTIVITY_THRESHOLD)
    }
}

impl InactivityMonitor {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    /// True when paused and idle for strictly longer than the threshold.
    /// Exactly at the threshold the answer is still `false`.
    pub fn check_inactivity(
        &self,
        last_interaction: DateTime<Utc>,
        now: DateTime<Utc>,
        is_following: bool,
    ) -> bool {
        !is_following && now - last_interaction > self.threshold
    }

    /// Checks once; returns to live if idle. Reports whether it did.
    pub async fn check_once(&self, state: &SharedWidgetState) -> bool {
        let mut state = state.lock().await;
        let follow = state.controller.state();
        let idle = self.check_inactivity(
            follow.last_interaction(),
            state.controller.now(),
            follow.is_following(),
        );

        if idle {
            tracing::info!(
                "No interaction for over {}s, returning to live",
                self.threshold.num_seconds()
            );
            state.controller.return_to_live();
        }
        idle
    }

    pub async fn run(self, state: SharedWidgetState, wake: Arc<Notify>, every: std::time::Duration) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if self.check_once(&state).await {
                wake.notify_one();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::clock::ManualClock;
    use crate::application::live_follow::LiveFollowController;
    use crate::application::widget::WidgetState;
    use crate::domain::time_window::IntervalLength;
    use tokio::sync::Mutex;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_check_inactivity_threshold() {
        let monitor = InactivityMonitor::default();
        let t0 = at(1_000);

        assert!(!monitor.check_inactivity(t0, at(1_059), false));
        assert!(!monitor.check_inactivity(t0, at(1_060), false));
        assert!(monitor.check_inactivity(t0, at(1_061), false));
    }

    #[test]
    fn test_following_is_never_inactive() {
        let monitor = InactivityMonitor::default();

        assert!(!monitor.check_inactivity(at(0), at(10_000), true));
    }

    #[tokio::test]
    async fn test_idle_paused_view_returns_to_live_once() {
        let clock = Arc::new(ManualClock::at(50_000));
        let mut controller = LiveFollowController::new(clock.clone(), IntervalLength::FifteenMinutes);
        controller.step_backward();
        let state: SharedWidgetState = Arc::new(Mutex::new(WidgetState::new(controller)));
        let monitor = InactivityMonitor::default();

        clock.advance(Duration::seconds(30));
        assert!(!monitor.check_once(&state).await);
        assert!(!state.lock().await.controller.is_following());

        clock.advance(Duration::seconds(31));
        assert!(monitor.check_once(&state).await);
        assert!(state.lock().await.controller.is_following());

        clock.advance(Duration::seconds(120));
        assert!(!monitor.check_once(&state).await);
    }

    #[tokio::test]
    async fn test_navigation_resets_idle_timer() {
        let clock = Arc::new(ManualClock::at(50_000));
        let mut controller = LiveFollowController::new(clock.clone(), IntervalLength::FifteenMinutes);
        controller.step_backward();
        let state: SharedWidgetState = Arc::new(Mutex::new(WidgetState::new(controller)));
        let monitor = InactivityMonitor::default();

        clock.advance(Duration::seconds(50));
        state.lock().await.controller.step_backward();
        clock.advance(Duration::seconds(50));

        assert!(!monitor.check_once(&state).await);
    }
}
