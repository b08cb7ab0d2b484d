// Live-follow state and its transitions
//
// Transitions borrow the current `FollowState` and return a new one; the
// caller decides where the latest value lives.
use super::time_window::{IntervalLength, TimeWindow};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowMode {
    Following,
    Paused,
}

/// Time of the most recent user navigation. Monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionClock(DateTime<Utc>);

impl InteractionClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    pub fn record(self, now: DateTime<Utc>) -> Self {
        Self(self.0.max(now))
    }

    pub fn last(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowState {
    window: TimeWindow,
    offset: Duration,
    interval: IntervalLength,
    mode: FollowMode,
    interaction: InteractionClock,
    generation: u64,
}

impl FollowState {
    pub fn new(now: DateTime<Utc>, interval: IntervalLength) -> Self {
        Self {
            window: TimeWindow::from_offset(now, Duration::zero(), interval),
            offset: Duration::zero(),
            interval,
            mode: FollowMode::Following,
            interaction: InteractionClock::new(now),
            generation: 0,
        }
    }

    pub fn step_backward(&self, now: DateTime<Utc>) -> Self {
        let step = self.interval.duration();
        Self {
            offset: self.offset + step,
            mode: FollowMode::Paused,
            interaction: self.interaction.record(now),
            ..*self
        }
        .with_window(self.window.shift_by(-step))
    }

    /// Reaching offset zero this way leaves the state paused; only
    /// `return_to_live` resumes following.
    pub fn step_forward(&self, now: DateTime<Utc>) -> Self {
        let step = self.interval.duration();
        Self {
            offset: (self.offset - step).max(Duration::zero()),
            mode: FollowMode::Paused,
            interaction: self.interaction.record(now),
            ..*self
        }
        .with_window(self.window.shift_by(step))
    }

    pub fn return_to_live(&self, now: DateTime<Utc>) -> Self {
        Self {
            offset: Duration::zero(),
            mode: FollowMode::Following,
            interaction: self.interaction.record(now),
            ..*self
        }
        .with_window(TimeWindow::from_offset(now, Duration::zero(), self.interval))
    }

    pub fn tick(&self, now: DateTime<Utc>) -> Self {
        match self.mode {
            FollowMode::Following => {
                self.with_window(TimeWindow::from_offset(now, self.offset, self.interval))
            }
            FollowMode::Paused => *self,
        }
    }

    pub fn with_interval(&self, now: DateTime<Utc>, interval: IntervalLength) -> Self {
        Self { interval, ..*self }.with_window(TimeWindow::from_offset(now, self.offset, interval))
    }

    fn with_window(self, window: TimeWindow) -> Self {
        if window == self.window {
            return self;
        }
        Self {
            window,
            generation: self.generation.wrapping_add(1),
            ..self
        }
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn offset(&self) -> Duration {
        self.offset
    }

    pub fn interval(&self) -> IntervalLength {
        self.interval
    }

    pub fn mode(&self) -> FollowMode {
        self.mode
    }

    pub fn is_following(&self) -> bool {
        self.mode == FollowMode::Following
    }

    pub fn last_interaction(&self) -> DateTime<Utc> {
        self.interaction.last()
    }

    /// Bumped whenever the window value changes.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_initial_state_follows_now() {
        let state = FollowState::new(at(3600), IntervalLength::FifteenMinutes);

        assert!(state.is_following());
        assert_eq!(state.offset(), Duration::zero());
        assert_eq!(state.window().end(), at(3600));
        assert_eq!(state.window().start(), at(2700));
    }

    #[test]
    fn test_paused_tick_is_noop() {
        let state = FollowState::new(at(3600), IntervalLength::FifteenMinutes).step_backward(at(3601));

        let ticked = state.tick(at(4000)).tick(at(5000));

        assert_eq!(ticked, state);
    }

    #[test]
    fn test_generation_tracks_window_changes() {
        let state = FollowState::new(at(3600), IntervalLength::FifteenMinutes);

        assert_eq!(state.tick(at(3600)).generation(), state.generation());
        assert_eq!(state.tick(at(3605)).generation(), state.generation() + 1);
        assert_eq!(state.step_backward(at(3600)).generation(), state.generation() + 1);
    }

    #[test]
    fn test_step_forward_floors_offset() {
        let state = FollowState::new(at(3600), IntervalLength::FifteenMinutes).step_forward(at(3600));

        assert_eq!(state.offset(), Duration::zero());
        assert_eq!(state.mode(), FollowMode::Paused);
        assert_eq!(state.window().end(), at(3600 + 900));
    }

    #[test]
    fn test_interaction_clock_never_decreases() {
        let state = FollowState::new(at(100), IntervalLength::FifteenMinutes)
            .step_backward(at(200))
            .step_forward(at(150));

        assert_eq!(state.last_interaction(), at(200));
    }

    #[test]
    fn test_interval_change_preserves_offset_and_mode() {
        let paused = FollowState::new(at(7200), IntervalLength::FifteenMinutes).step_backward(at(7200));

        let widened = paused.with_interval(at(7300), IntervalLength::OneHour);

        assert_eq!(widened.offset(), paused.offset());
        assert_eq!(widened.mode(), FollowMode::Paused);
        assert_eq!(widened.interval(), IntervalLength::OneHour);
        assert_eq!(widened.window().end(), at(7300 - 900));
        assert_eq!(widened.window().start(), at(7300 - 900 - 3600));
    }
}
