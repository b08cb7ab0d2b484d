// Refresh scheduler - Periodically refetches samples for the current window
use crate::application::sample_source::SampleSource;
use crate::application::widget::{DisplayError, SharedWidgetState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { samples: usize },
    Failed,
    /// The window moved while the fetch was in flight.
    Stale,
}

#[derive(Clone)]
pub struct RefreshScheduler {
    state: SharedWidgetState,
    source: Arc<dyn SampleSource>,
    wake: Arc<Notify>,
    every: Duration,
}

impl RefreshScheduler {
    pub fn new(
        state: SharedWidgetState,
        source: Arc<dyn SampleSource>,
        wake: Arc<Notify>,
        every: Duration,
    ) -> Self {
        Self {
            state,
            source,
            wake,
            every,
        }
    }

    pub async fn refresh_once(&self) -> RefreshOutcome {
        // The lock is released before fetching so navigation is never blocked.
        let (generation, window) = {
            let mut state = self.state.lock().await;
            if state.controller.is_following() {
                let now = state.controller.now();
                state.controller.tick(now);
            }
            (state.controller.generation(), state.controller.window())
        };

        let result = self.source.fetch(&window).await;

        let mut state = self.state.lock().await;
        if state.controller.generation() != generation {
            tracing::debug!(
                "Discarding response for stale window {}..{} (generation {} -> {})",
                window.start(),
                window.end(),
                generation,
                state.controller.generation()
            );
            return RefreshOutcome::Stale;
        }

        match result {
            Ok(samples) => {
                let count = samples.len();
                tracing::debug!("Loaded {} samples for {}..{}", count, window.start(), window.end());
                state.samples = samples;
                state.error = None;
                RefreshOutcome::Applied { samples: count }
            }
            Err(e) => {
                tracing::warn!("Refresh failed, keeping previous samples: {}", e);
                state.error = Some(DisplayError::DataUnavailable);
                RefreshOutcome::Failed
            }
        }
    }

    /// Refreshes on every cadence tick and whenever woken by navigation.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.wake.notified() => {}
            }
            self.refresh_once().await;
        }
    }
}
