// InfluxDB sample source - Fetches probe readings for a time window
use crate::application::sample_source::{SampleSource, SourceError};
use crate::domain::telemetry::{ParameterKey, Sample};
use crate::domain::time_window::TimeWindow;
use crate::infrastructure::config::{prepare_query, InfluxSettings};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct InfluxSampleSource {
    client: reqwest::Client,
    host: String,
    token: String,
    database: String,
    retention_policy: String,
    source: String,
    query_template: String,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResponse {
    results: Vec<InfluxQLResult>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResult {
    #[serde(default)]
    series: Option<Vec<InfluxQLSeries>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLSeries {
    columns: Vec<String>,
    values: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    tags: Option<HashMap<String, String>>,
}

impl InfluxSampleSource {
    pub fn new(settings: InfluxSettings, source: String, query_template: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: settings.host.trim_end_matches('/').to_string(),
            token: settings.token,
            database: settings.database,
            retention_policy: settings.retention_policy,
            source,
            query_template,
        }
    }

    fn build_query(&self, window: &TimeWindow) -> String {
        let mut vars = HashMap::new();
        vars.insert("source".to_string(), self.source.clone());
        vars.insert(
            "start".to_string(),
            window.start().to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        vars.insert(
            "end".to_string(),
            window.end().to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        prepare_query(&self.query_template, &vars)
    }

    fn build_query_url(&self, query: &str) -> String {
        let encoded_query = urlencoding::encode(query);
        format!(
            "{}/query?db={}&rp={}&q={}",
            self.host, self.database, self.retention_policy, encoded_query
        )
    }

    async fn execute_query(&self, query: &str) -> Result<InfluxQLResponse, SourceError> {
        let url = self.build_query_url(query);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status { status, body });
        }

        let data = response
            .json::<InfluxQLResponse>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        if let Some(error) = data.results.first().and_then(|r| r.error.as_ref()) {
            return Err(SourceError::Query(error.clone()));
        }

        Ok(data)
    }
}

#[async_trait]
impl SampleSource for InfluxSampleSource {
    async fn fetch(&self, window: &TimeWindow) -> Result<Vec<Sample>, SourceError> {
        let query = self.build_query(window);
        tracing::debug!("Executing sample query: {}", query);

        let response = self.execute_query(&query).await?;
        let samples = samples_from_response(response);

        tracing::debug!("Found {} samples for host {}", samples.len(), self.source);
        Ok(samples)
    }
}

/// Pivots per-probe series into one sample per timestamp, oldest first.
fn samples_from_response(response: InfluxQLResponse) -> Vec<Sample> {
    let mut by_time: BTreeMap<DateTime<Utc>, Sample> = BTreeMap::new();

    let series_list = response
        .results
        .into_iter()
        .next()
        .and_then(|r| r.series)
        .unwrap_or_default();

    for series in series_list {
        let probe_type = series.tags.as_ref().and_then(|tags| tags.get("probe_type"));
        let key = match probe_type.map(|pt| pt.parse::<ParameterKey>()) {
            Some(Ok(key)) => key,
            Some(Err(e)) => {
                tracing::debug!("Skipping series: {}", e);
                continue;
            }
            None => {
                tracing::warn!("Series without probe_type tag, skipping");
                continue;
            }
        };

        let time_idx = series.columns.iter().position(|c| c == "time").unwrap_or(0);
        let value_idx = series
            .columns
            .iter()
            .position(|c| c == "value" || c == "mean" || c == "last")
            .unwrap_or(1);

        for row in &series.values {
            let time = row
                .get(time_idx)
                .and_then(|v| v.as_str())
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|t| t.with_timezone(&Utc));
            let Some(time) = time else {
                continue;
            };

            let sample = by_time.entry(time).or_insert_with(|| Sample::new(time));
            // A null value leaves the parameter missing for this timestamp.
            if let Some(value) = row.get(value_idx).and_then(|v| v.as_f64()) {
                sample.values.insert(key, value);
            }
        }
    }

    by_time.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::time_window::IntervalLength;
    use chrono::Duration;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn source() -> InfluxSampleSource {
        InfluxSampleSource::new(
            InfluxSettings {
                host: "http://influx.local:8086/".to_string(),
                token: "secret".to_string(),
                database: "apex".to_string(),
                retention_policy: "autogen".to_string(),
            },
            "reef".to_string(),
            crate::infrastructure::config::DEFAULT_SAMPLE_QUERY.to_string(),
        )
    }

    fn response(value: serde_json::Value) -> InfluxQLResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_query_uses_window_bounds() {
        let window = TimeWindow::from_offset(at(1_700_000_000), Duration::zero(), IntervalLength::FifteenMinutes);

        let query = source().build_query(&window);

        assert!(query.contains("\"host\" = 'reef'"));
        assert!(query.contains("time >= '2023-11-14T21:58:20.000Z'"));
        assert!(query.contains("time < '2023-11-14T22:13:20.000Z'"));
    }

    #[test]
    fn test_query_url_trims_host_and_encodes() {
        let url = source().build_query_url("SELECT 1");

        assert_eq!(url, "http://influx.local:8086/query?db=apex&rp=autogen&q=SELECT%201");
    }

    #[test]
    fn test_pivots_series_by_timestamp() {
        let response = response(json!({
            "results": [{
                "series": [
                    {
                        "name": "apex_probe",
                        "tags": {"probe_type": "temp"},
                        "columns": ["time", "value"],
                        "values": [
                            ["2025-01-01T00:00:00Z", 25.1],
                            ["2025-01-01T00:00:05Z", 25.2]
                        ]
                    },
                    {
                        "name": "apex_probe",
                        "tags": {"probe_type": "ph"},
                        "columns": ["time", "value"],
                        "values": [
                            ["2025-01-01T00:00:05Z", 8.2],
                            ["2025-01-01T00:00:10Z", null]
                        ]
                    },
                    {
                        "name": "apex_probe",
                        "tags": {"probe_type": "feed"},
                        "columns": ["time", "value"],
                        "values": [["2025-01-01T00:00:00Z", 1.0]]
                    }
                ]
            }]
        }));

        let samples = samples_from_response(response);

        let t0 = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], Sample::new(t0).with_value(ParameterKey::Temperature, 25.1));
        assert_eq!(
            samples[1],
            Sample::new(t0 + Duration::seconds(5))
                .with_value(ParameterKey::Temperature, 25.2)
                .with_value(ParameterKey::Ph, 8.2)
        );
        assert_eq!(samples[2], Sample::new(t0 + Duration::seconds(10)));
    }

    #[test]
    fn test_empty_result_yields_no_samples() {
        let samples = samples_from_response(response(json!({"results": [{}]})));

        assert!(samples.is_empty());
    }
}
