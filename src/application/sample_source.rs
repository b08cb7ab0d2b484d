// Port for the external telemetry data source
use crate::domain::telemetry::Sample;
use crate::domain::time_window::TimeWindow;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request to data source failed: {0}")]
    Request(String),
    #[error("data source responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("data source query error: {0}")]
    Query(String),
    #[error("could not decode data source response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Samples inside `window`, ordered by timestamp. Retry policy is the
    /// implementation's concern.
    async fn fetch(&self, window: &TimeWindow) -> Result<Vec<Sample>, SourceError>;
}
