// InfluxDB occupancy provider implementation
use crate::application::series_provider::{check_selection, OccupancySeriesProvider};
use crate::domain::error::DashboardError;
use crate::domain::occupancy::{Granularity, OccupancyPoint, SeriesLabels};
use crate::domain::selection::{SelectionKey, YearList};
use crate::infrastructure::config::{prepare_query, InfluxSettings};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const DAILY_SUM_QUERY: &str = "SELECT sum(\"${field}\") AS count FROM \"${measurement}\" \
WHERE time >= '${start}' AND time < '${end}'${stop_filter} GROUP BY time(1d) fill(0)";

#[derive(Debug, Clone)]
pub struct InfluxSeriesProvider {
    client: reqwest::Client,
    host: String,
    token: String,
    database: String,
    retention_policy: String,
    measurement: String,
    field: String,
    stop: Option<String>,
    timeout: Duration,
    years: YearList,
    labels: SeriesLabels,
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
}

impl InfluxSeriesProvider {
    pub fn new(settings: &InfluxSettings, years: YearList, labels: SeriesLabels) -> Result<Self> {
        let timeout = Duration::from_secs(settings.timeout_secs.max(1));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build InfluxDB client")?;

        Ok(Self {
            client,
            host: settings.host.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            database: settings.database.clone(),
            retention_policy: settings.retention_policy.clone(),
            measurement: settings.measurement.clone(),
            field: settings.field.clone(),
            stop: settings.stop.clone(),
            timeout,
            years,
            labels,
        })
    }

    fn build_query_url(&self, query: &str) -> String {
        let encoded_query = urlencoding::encode(query);
        format!(
            "{}/query?db={}&rp={}&q={}",
            self.host, self.database, self.retention_policy, encoded_query
        )
    }

    fn build_query(&self, start: NaiveDate, end: NaiveDate) -> String {
        let stop_filter = match &self.stop {
            Some(stop) => format!(" AND \"stop\" = '{}'", stop.replace('\'', "\\'")),
            None => String::new(),
        };

        let mut vars = HashMap::new();
        vars.insert("field".to_string(), self.field.clone());
        vars.insert("measurement".to_string(), self.measurement.clone());
        vars.insert("start".to_string(), format!("{}T00:00:00Z", start));
        vars.insert("end".to_string(), format!("{}T00:00:00Z", end));
        vars.insert("stop_filter".to_string(), stop_filter);
        prepare_query(DAILY_SUM_QUERY, &vars)
    }

    async fn execute_query(&self, query: &str) -> Result<InfluxQLResponse> {
        let url = self.build_query_url(query);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send request to InfluxDB (timeout {:?})", self.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("InfluxDB query failed with status {}: {}", status, body);
        }

        let data = response
            .json::<InfluxQLResponse>()
            .await
            .context("Failed to parse InfluxDB response")?;

        if let Some(result) = data.results.first() {
            if let Some(error) = &result.error {
                anyhow::bail!("InfluxDB query error: {}", error);
            }
        }

        Ok(data)
    }
}

/// [start, end) date window covering the key
fn query_window(key: &SelectionKey) -> Result<(NaiveDate, NaiveDate), DashboardError> {
    let year = key.year_number()?;
    let window = match key.granularity {
        Granularity::DailyInMonth => {
            let start = NaiveDate::from_ymd_opt(year, key.month, 1);
            let end = if key.month == 12 {
                NaiveDate::from_ymd_opt(year + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(year, key.month + 1, 1)
            };
            start.zip(end)
        }
        Granularity::MonthlyInYear => {
            NaiveDate::from_ymd_opt(year, 1, 1).zip(NaiveDate::from_ymd_opt(year + 1, 1, 1))
        }
    };
    window.ok_or_else(|| DashboardError::invalid_selection(format!("no calendar window for {}", key.year)))
}

/// Daily (date, count) rows from a GROUP BY time(1d) response
fn parse_daily_rows(response: &InfluxQLResponse) -> Vec<(NaiveDate, u64)> {
    let mut rows = Vec::new();
    let Some(series) = response.results.first().and_then(|r| r.series.as_ref()) else {
        return rows;
    };

    for s in series {
        let time_idx = s.columns.iter().position(|c| c == "time").unwrap_or(0);
        let value_idx = s
            .columns
            .iter()
            .position(|c| c == "count" || c == "sum")
            .unwrap_or(1);

        for value_row in &s.values {
            let (Some(time), Some(value)) = (value_row.get(time_idx), value_row.get(value_idx)) else {
                continue;
            };
            let Some(time) = time.as_str() else {
                continue;
            };
            match chrono::DateTime::parse_from_rfc3339(time) {
                Ok(time) => rows.push((time.date_naive(), json_count(value))),
                Err(e) => tracing::warn!("Skipping InfluxDB row with bad timestamp {}: {}", time, e),
            }
        }
    }

    rows
}

// fill(0) yields numbers; null, negative and fractional sums are normalized to whole non-negative counts.
fn json_count(value: &serde_json::Value) -> u64 {
    if let Some(v) = value.as_u64() {
        return v;
    }
    match value.as_f64() {
        Some(v) if v > 0.0 => v.round() as u64,
        _ => 0,
    }
}

/// Fold daily rows into the key's buckets; an empty row set means no data
fn fold_rows(key: &SelectionKey, buckets: u32, rows: &[(NaiveDate, u64)], labels: &SeriesLabels) -> Vec<OccupancyPoint> {
    if rows.is_empty() {
        return Vec::new();
    }

    let mut counts = vec![0u64; buckets as usize];
    for (date, count) in rows {
        let index = match key.granularity {
            Granularity::DailyInMonth => date.day0(),
            Granularity::MonthlyInYear => date.month0(),
        } as usize;
        if let Some(slot) = counts.get_mut(index) {
            *slot += count;
        }
    }

    labels.points(key.granularity, counts)
}

#[async_trait]
impl OccupancySeriesProvider for InfluxSeriesProvider {
    async fn generate_series(&self, key: &SelectionKey) -> Result<Vec<OccupancyPoint>, DashboardError> {
        let buckets = check_selection(&self.years, key)?;
        let (start, end) = query_window(key)?;
        let query = self.build_query(start, end);

        tracing::debug!("Executing occupancy query: {}", query);
        let response = self.execute_query(&query).await?;

        let rows: Vec<(NaiveDate, u64)> = parse_daily_rows(&response)
            .into_iter()
            .filter(|(date, _)| *date >= start && *date < end)
            .collect();

        tracing::debug!(
            year = %key.year,
            granularity = %key.granularity,
            rows = rows.len(),
            "Fetched occupancy rows from InfluxDB"
        );

        Ok(fold_rows(key, buckets, &rows, &self.labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> InfluxSettings {
        InfluxSettings {
            host: "http://influx:8086/".to_string(),
            token: "secret".to_string(),
            database: "busstop".to_string(),
            retention_policy: "autogen".to_string(),
            measurement: "occupancy".to_string(),
            field: "count".to_string(),
            stop: Some("gunpo's-01".to_string()),
            timeout_secs: 5,
        }
    }

    fn provider() -> InfluxSeriesProvider {
        InfluxSeriesProvider::new(&settings(), YearList::descending_from(2024, 5), SeriesLabels::default()).unwrap()
    }

    fn response(json: serde_json::Value) -> InfluxQLResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_request_timeout_from_settings() {
        assert_eq!(provider().timeout, Duration::from_secs(5));

        let mut settings = settings();
        settings.timeout_secs = 0;
        let provider =
            InfluxSeriesProvider::new(&settings, YearList::descending_from(2024, 5), SeriesLabels::default()).unwrap();
        assert_eq!(provider.timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_build_query() {
        let provider = provider();
        let query = provider.build_query(
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        );
        assert_eq!(
            query,
            "SELECT sum(\"count\") AS count FROM \"occupancy\" WHERE time >= '2024-02-01T00:00:00Z' \
AND time < '2024-03-01T00:00:00Z' AND \"stop\" = 'gunpo\\'s-01' GROUP BY time(1d) fill(0)"
        );

        let url = provider.build_query_url("SELECT 1");
        assert_eq!(url, "http://influx:8086/query?db=busstop&rp=autogen&q=SELECT%201");
    }

    #[test]
    fn test_query_window() {
        let december = SelectionKey::new("2023", Granularity::DailyInMonth, 12);
        let (start, end) = query_window(&december).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let year = SelectionKey::new("2022", Granularity::MonthlyInYear, 7);
        let (start, end) = query_window(&year).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    }

    #[test]
    fn test_daily_rows_fill_true_month_length() {
        let data = response(serde_json::json!({
            "results": [{
                "series": [{
                    "name": "occupancy",
                    "columns": ["time", "count"],
                    "values": [
                        ["2023-02-01T00:00:00Z", 120],
                        ["2023-02-02T00:00:00Z", 130.6],
                        ["2023-02-28T00:00:00Z", null]
                    ]
                }]
            }]
        }));

        let key = SelectionKey::new("2023", Granularity::DailyInMonth, 2);
        let rows = parse_daily_rows(&data);
        let points = fold_rows(&key, 28, &rows, &SeriesLabels::default());

        assert_eq!(points.len(), 28);
        assert_eq!(points[0], OccupancyPoint::new("1일", 120));
        assert_eq!(points[1], OccupancyPoint::new("2일", 131));
        assert_eq!(points[2].count, 0);
        assert_eq!(points[27], OccupancyPoint::new("28일", 0));
    }

    #[test]
    fn test_daily_rows_fold_into_months() {
        let data = response(serde_json::json!({
            "results": [{
                "series": [{
                    "name": "occupancy",
                    "columns": ["time", "count"],
                    "values": [
                        ["2022-01-01T00:00:00Z", 100],
                        ["2022-01-31T00:00:00Z", 50],
                        ["2022-03-15T00:00:00Z", 7],
                        ["2022-12-31T00:00:00Z", 9]
                    ]
                }]
            }]
        }));

        let key = SelectionKey::new("2022", Granularity::MonthlyInYear, 1);
        let points = fold_rows(&key, 12, &parse_daily_rows(&data), &SeriesLabels::default());

        let counts: Vec<u64> = points.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![150, 0, 7, 0, 0, 0, 0, 0, 0, 0, 0, 9]);
        assert_eq!(points[11].label, "12월");
    }

    #[test]
    fn test_missing_series_is_no_data() {
        let data = response(serde_json::json!({ "results": [{ "statement_id": 0 }] }));
        let key = SelectionKey::new("2024", Granularity::MonthlyInYear, 1);
        assert!(fold_rows(&key, 12, &parse_daily_rows(&data), &SeriesLabels::default()).is_empty());
    }

    #[test]
    fn test_json_count() {
        assert_eq!(json_count(&serde_json::json!(5)), 5);
        assert_eq!(json_count(&serde_json::json!(-4)), 0);
        assert_eq!(json_count(&serde_json::json!(2.4)), 2);
        assert_eq!(json_count(&serde_json::Value::Null), 0);
    }
}
