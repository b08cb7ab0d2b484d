// Presentation layer - HTTP boundary for the rendering front-end
pub mod app_state;
pub mod handlers;
