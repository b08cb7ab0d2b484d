// Live-follow controller - Owns the window state and applies navigation
use crate::application::clock::Clock;
use crate::domain::follow::FollowState;
use crate::domain::time_window::{IntervalLength, TimeWindow};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Holds the latest `FollowState` and reads "now" from an injected clock.
/// None of its operations can fail.
pub struct LiveFollowController {
    state: FollowState,
    clock: Arc<dyn Clock>,
}

impl LiveFollowController {
    pub fn new(clock: Arc<dyn Clock>, interval: IntervalLength) -> Self {
        let state = FollowState::new(clock.now(), interval);
        Self { state, clock }
    }

    pub fn step_backward(&mut self) {
        self.state = self.state.step_backward(self.clock.now());
        tracing::debug!(
            "Stepped backward: offset={}m window={}..{}",
            self.state.offset().num_minutes(),
            self.state.window().start(),
            self.state.window().end()
        );
    }

    pub fn step_forward(&mut self) {
        self.state = self.state.step_forward(self.clock.now());
        tracing::debug!(
            "Stepped forward: offset={}m window={}..{}",
            self.state.offset().num_minutes(),
            self.state.window().start(),
            self.state.window().end()
        );
    }

    pub fn return_to_live(&mut self) {
        self.state = self.state.return_to_live(self.clock.now());
        tracing::debug!("Returned to live: window ends {}", self.state.window().end());
    }

    /// Advances the window to `now` while following; paused state is untouched.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.state = self.state.tick(now);
    }

    pub fn on_interval_length_changed(&mut self, interval: IntervalLength) {
        self.state = self.state.with_interval(self.clock.now(), interval);
        tracing::debug!(
            "Interval changed to {}m, following={}",
            interval.minutes(),
            self.state.is_following()
        );
    }

    pub fn state(&self) -> &FollowState {
        &self.state
    }

    pub fn window(&self) -> TimeWindow {
        self.state.window()
    }

    pub fn is_following(&self) -> bool {
        self.state.is_following()
    }

    pub fn generation(&self) -> u64 {
        self.state.generation()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
