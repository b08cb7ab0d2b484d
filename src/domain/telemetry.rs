// Telemetry sample domain models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Probe types reported by the controller, keyed by their `probe_type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParameterKey {
    #[serde(rename = "temp")]
    Temperature,
    #[serde(rename = "ph")]
    Ph,
    #[serde(rename = "orp")]
    Orp,
    #[serde(rename = "cond")]
    Salinity,
    #[serde(rename = "amps")]
    Current,
    #[serde(rename = "pwr")]
    Power,
}

impl ParameterKey {
    pub const ALL: [ParameterKey; 6] = [
        ParameterKey::Temperature,
        ParameterKey::Ph,
        ParameterKey::Orp,
        ParameterKey::Salinity,
        ParameterKey::Current,
        ParameterKey::Power,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            ParameterKey::Temperature => "temp",
            ParameterKey::Ph => "ph",
            ParameterKey::Orp => "orp",
            ParameterKey::Salinity => "cond",
            ParameterKey::Current => "amps",
            ParameterKey::Power => "pwr",
        }
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown parameter key: {0}")]
pub struct UnknownParameter(pub String);

impl FromStr for ParameterKey {
    type Err = UnknownParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        ParameterKey::ALL
            .into_iter()
            .find(|key| key.tag() == lowered)
            .ok_or_else(|| UnknownParameter(s.to_string()))
    }
}

/// One timestamped reading across any number of parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub values: BTreeMap<ParameterKey, f64>,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, key: ParameterKey, value: f64) -> Self {
        self.values.insert(key, value);
        self
    }

    /// Reading for `key`, or `None` when the sample did not carry it.
    pub fn value(&self, key: ParameterKey) -> Option<f64> {
        self.values.get(&key).copied().filter(|v| v.is_finite())
    }
}
