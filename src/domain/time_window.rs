// Time window value type and interval lengths
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("window start {start} is not before end {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("unsupported interval length: {0} minutes")]
    InvalidInterval(u32),
}

/// Selectable window widths. Only these lengths can reach the controller,
/// so every window built from one has `start < end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum IntervalLength {
    #[default]
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    ThreeHours,
    SixHours,
    TwelveHours,
    OneDay,
}

impl IntervalLength {
    pub const ALL: [IntervalLength; 7] = [
        IntervalLength::FifteenMinutes,
        IntervalLength::ThirtyMinutes,
        IntervalLength::OneHour,
        IntervalLength::ThreeHours,
        IntervalLength::SixHours,
        IntervalLength::TwelveHours,
        IntervalLength::OneDay,
    ];

    pub fn minutes(&self) -> u32 {
        match self {
            IntervalLength::FifteenMinutes => 15,
            IntervalLength::ThirtyMinutes => 30,
            IntervalLength::OneHour => 60,
            IntervalLength::ThreeHours => 180,
            IntervalLength::SixHours => 360,
            IntervalLength::TwelveHours => 720,
            IntervalLength::OneDay => 1440,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.minutes()))
    }
}

impl TryFrom<u32> for IntervalLength {
    type Error = WindowError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        IntervalLength::ALL
            .into_iter()
            .find(|interval| interval.minutes() == minutes)
            .ok_or(WindowError::InvalidInterval(minutes))
    }
}

impl From<IntervalLength> for u32 {
    fn from(interval: IntervalLength) -> Self {
        interval.minutes()
    }
}

/// Displayed `[start, end)` range of telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, WindowError> {
        if start >= end {
            return Err(WindowError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window ending `offset` before `now`, one interval wide.
    pub fn from_offset(now: DateTime<Utc>, offset: Duration, interval: IntervalLength) -> Self {
        let end = now - offset;
        Self {
            start: end - interval.duration(),
            end,
        }
    }

    /// Both edges moved by `delta`; the width never changes.
    pub fn shift_by(&self, delta: Duration) -> Self {
        Self {
            start: self.start + delta,
            end: self.end + delta,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp < self.end
    }
}
