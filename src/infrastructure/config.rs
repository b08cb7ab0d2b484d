use crate::application::widget::WidgetSettings;
use crate::domain::telemetry::ParameterKey;
use crate::domain::time_window::IntervalLength;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_SAMPLE_QUERY: &str = "SELECT \"value\" FROM \"apex_probe\" WHERE \"host\" = '${source}' AND time >= '${start}' AND time < '${end}' GROUP BY \"probe_type\"";

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxConfig {
    pub influx: InfluxSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxSettings {
    pub host: String,
    pub token: String,
    pub database: String,
    pub retention_policy: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetConfig {
    pub bind_addr: String,
    /// Controller host tag the widget shows.
    pub source: String,
    pub query: String,
    pub default_interval_minutes: u32,
    pub refresh_secs: u64,
    pub inactivity_check_secs: u64,
    pub inactivity_threshold_secs: i64,
    /// Defaults to twice the refresh cadence.
    pub gap_threshold_secs: Option<i64>,
    #[serde(default = "all_parameters")]
    pub parameters: Vec<ParameterKey>,
}

fn all_parameters() -> Vec<ParameterKey> {
    ParameterKey::ALL.to_vec()
}

impl WidgetConfig {
    pub fn settings(&self) -> anyhow::Result<WidgetSettings> {
        let default_interval = IntervalLength::try_from(self.default_interval_minutes)?;
        if self.refresh_secs == 0 || self.inactivity_check_secs == 0 {
            anyhow::bail!("refresh_secs and inactivity_check_secs must be positive");
        }
        let gap_threshold_secs = self
            .gap_threshold_secs
            .unwrap_or(2 * self.refresh_secs as i64);

        Ok(WidgetSettings {
            default_interval,
            refresh_every: Duration::from_secs(self.refresh_secs),
            inactivity_check_every: Duration::from_secs(self.inactivity_check_secs),
            inactivity_threshold: chrono::Duration::seconds(self.inactivity_threshold_secs),
            gap_threshold: chrono::Duration::seconds(gap_threshold_secs),
            parameters: self.parameters.clone(),
        })
    }
}

pub fn load_influx_config() -> anyhow::Result<InfluxConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/influx"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_widget_config() -> anyhow::Result<WidgetConfig> {
    let settings = widget_defaults()?
        .add_source(config::File::with_name("config/widget").required(false))
        .build()?;

    Ok(settings.try_deserialize()?)
}

fn widget_defaults() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("bind_addr", "0.0.0.0:8080")?
        .set_default("source", "reef")?
        .set_default("query", DEFAULT_SAMPLE_QUERY)?
        .set_default("default_interval_minutes", 15)?
        .set_default("refresh_secs", 5)?
        .set_default("inactivity_check_secs", 1)?
        .set_default("inactivity_threshold_secs", 60)?)
}

/// Replace template variables in a query string
pub fn prepare_query(query: &str, vars: &HashMap<String, String>) -> String {
    let mut result = query.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}
