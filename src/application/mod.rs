// Application layer - Window state machine, periodic tasks, and ports
pub mod clock;
pub mod inactivity;
pub mod live_follow;
pub mod refresh;
pub mod sample_source;
pub mod widget;
