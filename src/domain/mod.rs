// Domain layer - Pure telemetry and windowing types
pub mod follow;
pub mod series;
pub mod telemetry;
pub mod time_window;
