// Dashboard widget - Hosts the follow controller and its periodic tasks
use crate::application::clock::Clock;
use crate::application::inactivity::{InactivityMonitor, DEFAULT_INACTIVITY_THRESHOLD};
use crate::application::live_follow::LiveFollowController;
use crate::application::refresh::{RefreshScheduler, DEFAULT_REFRESH_INTERVAL};
use crate::application::sample_source::SampleSource;
use crate::domain::follow::FollowMode;
use crate::domain::series::{GapAwareSeriesBuilder, GappedSeries};
use crate::domain::telemetry::{ParameterKey, Sample};
use crate::domain::time_window::{IntervalLength, TimeWindow};
use futures::StreamExt;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;

/// The only error the rendering side ever sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayError {
    DataUnavailable,
}

pub struct WidgetState {
    pub controller: LiveFollowController,
    pub samples: Vec<Sample>,
    pub error: Option<DisplayError>,
}

impl WidgetState {
    pub fn new(controller: LiveFollowController) -> Self {
        Self {
            controller,
            samples: Vec::new(),
            error: None,
        }
    }
}

pub type SharedWidgetState = Arc<Mutex<WidgetState>>;

#[derive(Debug, Clone)]
pub struct WidgetSettings {
    pub default_interval: IntervalLength,
    pub refresh_every: Duration,
    pub inactivity_check_every: Duration,
    pub inactivity_threshold: chrono::Duration,
    pub gap_threshold: chrono::Duration,
    pub parameters: Vec<ParameterKey>,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            default_interval: IntervalLength::default(),
            refresh_every: DEFAULT_REFRESH_INTERVAL,
            inactivity_check_every: Duration::from_secs(1),
            inactivity_threshold: DEFAULT_INACTIVITY_THRESHOLD,
            gap_threshold: chrono::Duration::seconds(10),
            parameters: ParameterKey::ALL.to_vec(),
        }
    }
}

/// What the rendering layer draws.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetView {
    pub series: BTreeMap<ParameterKey, GappedSeries>,
    pub window: TimeWindow,
    pub is_following: bool,
    pub mode: FollowMode,
    pub offset_minutes: i64,
    pub interval_minutes: u32,
    pub error: Option<DisplayError>,
}

/// Handles for the widget's periodic tasks. Dropping it stops all of them.
pub struct WidgetTasks {
    handles: Vec<JoinHandle<()>>,
}

impl WidgetTasks {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for WidgetTasks {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
        tracing::debug!("Stopped {} widget tasks", self.handles.len());
    }
}

pub struct DashboardWidget {
    state: SharedWidgetState,
    source: Arc<dyn SampleSource>,
    builder: GapAwareSeriesBuilder,
    settings: WidgetSettings,
    interval: watch::Sender<IntervalLength>,
    wake: Arc<Notify>,
}

impl DashboardWidget {
    pub fn new(source: Arc<dyn SampleSource>, clock: Arc<dyn Clock>, settings: WidgetSettings) -> Self {
        let controller = LiveFollowController::new(clock, settings.default_interval);
        let (interval, _) = watch::channel(settings.default_interval);

        Self {
            state: Arc::new(Mutex::new(WidgetState::new(controller))),
            source,
            builder: GapAwareSeriesBuilder::new(settings.gap_threshold),
            settings,
            interval,
            wake: Arc::new(Notify::new()),
        }
    }

    /// Starts refresh, inactivity and interval-observer tasks.
    pub fn spawn(&self) -> WidgetTasks {
        let scheduler = RefreshScheduler::new(
            self.state.clone(),
            self.source.clone(),
            self.wake.clone(),
            self.settings.refresh_every,
        );
        let monitor = InactivityMonitor::new(self.settings.inactivity_threshold);

        let handles = vec![
            tokio::spawn(scheduler.run()),
            tokio::spawn(monitor.run(
                self.state.clone(),
                self.wake.clone(),
                self.settings.inactivity_check_every,
            )),
            tokio::spawn(observe_interval(
                self.interval.subscribe(),
                self.state.clone(),
                self.wake.clone(),
            )),
        ];

        tracing::info!(
            "Widget started: refresh every {:?}, inactivity threshold {}s",
            self.settings.refresh_every,
            self.settings.inactivity_threshold.num_seconds()
        );
        WidgetTasks { handles }
    }

    pub async fn step_backward(&self) -> WidgetView {
        self.navigate(LiveFollowController::step_backward).await
    }

    pub async fn step_forward(&self) -> WidgetView {
        self.navigate(LiveFollowController::step_forward).await
    }

    pub async fn return_to_live(&self) -> WidgetView {
        self.navigate(LiveFollowController::return_to_live).await
    }

    async fn navigate(&self, action: fn(&mut LiveFollowController)) -> WidgetView {
        let view = {
            let mut state = self.state.lock().await;
            action(&mut state.controller);
            self.render(&state)
        };
        self.wake.notify_one();
        view
    }

    /// Publishes a new selected interval; observers re-center the window.
    pub fn select_interval(&self, interval: IntervalLength) {
        self.interval.send_if_modified(|current| {
            if *current == interval {
                return false;
            }
            *current = interval;
            true
        });
    }

    pub fn selected_interval(&self) -> IntervalLength {
        *self.interval.borrow()
    }

    pub async fn view(&self) -> WidgetView {
        let state = self.state.lock().await;
        self.render(&state)
    }

    fn render(&self, state: &WidgetState) -> WidgetView {
        let follow = state.controller.state();
        let window = follow.window();

        WidgetView {
            series: self
                .builder
                .build_all(&state.samples, &window, &self.settings.parameters),
            window,
            is_following: follow.is_following(),
            mode: follow.mode(),
            offset_minutes: follow.offset().num_minutes(),
            interval_minutes: follow.interval().minutes(),
            error: state.error,
        }
    }
}

async fn observe_interval(
    interval: watch::Receiver<IntervalLength>,
    state: SharedWidgetState,
    wake: Arc<Notify>,
) {
    let mut changes = WatchStream::from_changes(interval);
    while let Some(interval) = changes.next().await {
        state.lock().await.controller.on_interval_length_changed(interval);
        wake.notify_one();
    }
}
