// Gap-aware series construction
use super::telemetry::{ParameterKey, Sample};
use super::time_window::TimeWindow;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// A chart datum. `value: None` marks a break the renderer must not bridge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub time: DateTime<Utc>,
    pub value: Option<f64>,
}

impl SeriesPoint {
    pub fn value(time: DateTime<Utc>, value: f64) -> Self {
        Self {
            time,
            value: Some(value),
        }
    }

    pub fn gap(time: DateTime<Utc>) -> Self {
        Self { time, value: None }
    }

    pub fn is_gap(&self) -> bool {
        self.value.is_none()
    }
}

pub type GappedSeries = Vec<SeriesPoint>;

#[derive(Debug, Clone, Copy)]
pub struct GapAwareSeriesBuilder {
    threshold: Duration,
}

impl GapAwareSeriesBuilder {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    /// Series for `key`, in arrival order.
    ///
    /// Consecutive samples further apart than the threshold get one gap
    /// marker at their midpoint. A sample without `key` becomes a gap marker
    /// at its own timestamp so the time axis stays intact.
    pub fn build(&self, samples: &[Sample], key: ParameterKey) -> GappedSeries {
        let mut series = Vec::with_capacity(samples.len());
        let mut previous: Option<DateTime<Utc>> = None;

        for sample in samples {
            if let Some(prev) = previous {
                let delta = sample.timestamp - prev;
                if delta > self.threshold {
                    series.push(SeriesPoint::gap(prev + delta / 2));
                }
            }

            series.push(match sample.value(key) {
                Some(value) => SeriesPoint::value(sample.timestamp, value),
                None => SeriesPoint::gap(sample.timestamp),
            });
            previous = Some(sample.timestamp);
        }

        series
    }

    /// One series per key, built from the samples that fall inside `window`.
    pub fn build_all(
        &self,
        samples: &[Sample],
        window: &TimeWindow,
        keys: &[ParameterKey],
    ) -> BTreeMap<ParameterKey, GappedSeries> {
        let visible: Vec<Sample> = samples
            .iter()
            .filter(|s| window.contains(s.timestamp))
            .cloned()
            .collect();

        keys.iter()
            .map(|key| (*key, self.build(&visible, *key)))
            .collect()
    }
}
