// Application state for HTTP handlers
use crate::application::widget::DashboardWidget;

pub struct AppState {
    pub widget: DashboardWidget,
}
