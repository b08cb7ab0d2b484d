// HTTP request handlers
use crate::application::widget::WidgetView;
use crate::domain::time_window::IntervalLength;
use crate::presentation::app_state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct IntervalRequest {
    pub minutes: u32,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current series, window and follow state
pub async fn widget_view(State(state): State<Arc<AppState>>) -> Json<WidgetView> {
    Json(state.widget.view().await)
}

pub async fn step_back(State(state): State<Arc<AppState>>) -> Json<WidgetView> {
    Json(state.widget.step_backward().await)
}

pub async fn step_forward(State(state): State<Arc<AppState>>) -> Json<WidgetView> {
    Json(state.widget.step_forward().await)
}

pub async fn return_to_live(State(state): State<Arc<AppState>>) -> Json<WidgetView> {
    Json(state.widget.return_to_live().await)
}

/// Change the selected interval; only the enumerated lengths are accepted
pub async fn select_interval(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IntervalRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let interval = IntervalLength::try_from(request.minutes).map_err(|e| {
        tracing::debug!("Rejected interval selection: {}", e);
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    state.widget.select_interval(interval);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::clock::ManualClock;
    use crate::application::sample_source::{SampleSource, SourceError};
    use crate::application::widget::{DashboardWidget, DisplayError, WidgetSettings};
    use crate::domain::telemetry::Sample;
    use crate::domain::time_window::TimeWindow;
    use async_trait::async_trait;

    struct UnreachableSource;

    #[async_trait]
    impl SampleSource for UnreachableSource {
        async fn fetch(&self, _window: &TimeWindow) -> Result<Vec<Sample>, SourceError> {
            Err(SourceError::Request("host unreachable".to_string()))
        }
    }

    fn app_state() -> Arc<AppState> {
        let widget = DashboardWidget::new(
            Arc::new(UnreachableSource),
            Arc::new(ManualClock::at(300_000)),
            WidgetSettings::default(),
        );
        Arc::new(AppState { widget })
    }

    #[tokio::test]
    async fn test_navigation_endpoints() {
        let state = app_state();

        let Json(view) = step_back(State(state.clone())).await;
        assert_eq!(view.offset_minutes, 15);
        assert!(!view.is_following);

        let Json(view) = step_forward(State(state.clone())).await;
        assert_eq!(view.offset_minutes, 0);
        assert!(!view.is_following);

        let Json(view) = return_to_live(State(state.clone())).await;
        assert!(view.is_following);
        assert_eq!(view.error, None);
    }

    #[tokio::test]
    async fn test_select_interval_validates_minutes() {
        let state = app_state();

        let accepted = select_interval(State(state.clone()), Json(IntervalRequest { minutes: 60 })).await;
        assert_eq!(accepted, Ok(StatusCode::NO_CONTENT));
        assert_eq!(state.widget.selected_interval(), IntervalLength::OneHour);

        let rejected = select_interval(State(state.clone()), Json(IntervalRequest { minutes: 7 })).await;
        assert_eq!(rejected.map_err(|(status, _)| status), Err(StatusCode::BAD_REQUEST));
        assert_eq!(state.widget.selected_interval(), IntervalLength::OneHour);
    }

    #[tokio::test]
    async fn test_view_reports_unavailable_data() {
        let state = app_state();
        let _tasks = state.widget.spawn();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        let Json(view) = widget_view(State(state)).await;
        assert_eq!(view.error, Some(DisplayError::DataUnavailable));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["error"], "data_unavailable");
        assert_eq!(json["mode"], "following");
        assert_eq!(json["interval_minutes"], 15);
        assert!(json["series"]["temp"].as_array().unwrap().is_empty());
    }
}
