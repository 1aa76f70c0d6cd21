use crate::application::series_provider::OccupancySeriesProvider;
use crate::domain::device_status::DeviceCategory;
use crate::domain::error::DashboardError;
use crate::domain::occupancy::{Granularity, SeriesLabels};
use crate::domain::selection::{SelectionKey, YearList};
use crate::infrastructure::fixed_provider::FixedSeriesProvider;
use crate::infrastructure::influx_provider::InfluxSeriesProvider;
use crate::infrastructure::synthetic_provider::SyntheticSeriesProvider;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
    #[serde(default)]
    pub labels: SeriesLabels,
    pub provider: ProviderSettings,
    #[serde(default)]
    pub devices: Vec<DeviceCategory>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardSettings {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_year_span")]
    pub year_span: usize,
    #[serde(default)]
    pub latest_year: Option<i32>,
    #[serde(default = "default_granularity")]
    pub initial_granularity: Granularity,
    #[serde(default)]
    pub initial_month: Option<u32>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            year_span: default_year_span(),
            latest_year: None,
            initial_granularity: default_granularity(),
            initial_month: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Synthetic,
    Fixed,
    Influx,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    /// Must be set for the synthetic provider
    #[serde(default)]
    pub demo: bool,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub fixed: Option<FixedSettings>,
    #[serde(default)]
    pub influx: Option<InfluxSettings>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FixedSettings {
    #[serde(default)]
    pub daily: Vec<u64>,
    #[serde(default)]
    pub monthly: Vec<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxSettings {
    pub host: String,
    pub token: String,
    pub database: String,
    pub retention_policy: String,
    #[serde(default = "default_measurement")]
    pub measurement: String,
    #[serde(default = "default_field")]
    pub field: String,
    #[serde(default)]
    pub stop: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_title() -> String {
    "스마트 정류장 대시보드".to_string()
}

fn default_year_span() -> usize {
    24
}

fn default_granularity() -> Granularity {
    Granularity::DailyInMonth
}

fn default_measurement() -> String {
    "occupancy".to_string()
}

fn default_field() -> String {
    "count".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), DashboardError> {
        let mut names = HashSet::new();
        for device in &self.devices {
            if device.name.trim().is_empty() {
                return Err(DashboardError::invalid_config("device name must not be empty"));
            }
            if !names.insert(device.name.as_str()) {
                return Err(DashboardError::invalid_config(format!(
                    "duplicate device category '{}'",
                    device.name
                )));
            }
        }

        if self.dashboard.year_span == 0 {
            return Err(DashboardError::invalid_config("dashboard.year_span must be at least 1"));
        }
        if let Some(latest) = self.dashboard.latest_year {
            check_year_window(latest, self.dashboard.year_span)?;
        }

        match self.provider.kind {
            ProviderKind::Fixed if self.provider.fixed.is_none() => {
                Err(DashboardError::invalid_config("provider.fixed section is required"))
            }
            ProviderKind::Influx if self.provider.influx.is_none() => {
                Err(DashboardError::invalid_config("provider.influx section is required"))
            }
            _ => Ok(()),
        }
    }

    /// Newest year (configured or `current_year`) down through `year_span` entries
    pub fn year_list(&self, current_year: i32) -> Result<YearList, DashboardError> {
        let latest = self.dashboard.latest_year.unwrap_or(current_year);
        check_year_window(latest, self.dashboard.year_span)?;
        Ok(YearList::descending_from(latest, self.dashboard.year_span))
    }

    pub fn initial_selection(&self, years: &YearList, current_month: u32) -> SelectionKey {
        SelectionKey::new(
            years.latest(),
            self.dashboard.initial_granularity,
            self.dashboard.initial_month.unwrap_or(current_month),
        )
    }
}

/// Every listed year must be a 4-digit year
fn check_year_window(latest: i32, span: usize) -> Result<(), DashboardError> {
    let oldest = i64::from(latest) - (span.max(1) as i64 - 1);
    if latest > 9999 || oldest < 1000 {
        return Err(DashboardError::invalid_config(format!(
            "year window {}..={} must stay within 1000..=9999",
            oldest, latest
        )));
    }
    Ok(())
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard"))
        .add_source(config::File::with_name("config/local").required(false))
        .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"))
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}

/// Builds the configured series source. Synthetic data is refused unless the run is marked as a demo.
pub fn build_provider(
    settings: &ProviderSettings,
    years: YearList,
    labels: SeriesLabels,
) -> Result<Arc<dyn OccupancySeriesProvider>, DashboardError> {
    match settings.kind {
        ProviderKind::Synthetic => {
            if !settings.demo {
                return Err(DashboardError::invalid_config(
                    "synthetic provider generates placeholder data; set provider.demo = true to run it",
                ));
            }
            tracing::warn!("Serving synthetic occupancy data (demo mode)");
            let provider: Arc<dyn OccupancySeriesProvider> = match settings.seed {
                Some(seed) => Arc::new(SyntheticSeriesProvider::seeded(years, labels, seed)),
                None => Arc::new(SyntheticSeriesProvider::from_os_rng(years, labels)),
            };
            Ok(provider)
        }
        ProviderKind::Fixed => {
            let fixed = settings
                .fixed
                .clone()
                .ok_or_else(|| DashboardError::invalid_config("provider.fixed section is required"))?;
            Ok(Arc::new(FixedSeriesProvider::new(years, labels, fixed.daily, fixed.monthly)))
        }
        ProviderKind::Influx => {
            let influx = settings
                .influx
                .as_ref()
                .ok_or_else(|| DashboardError::invalid_config("provider.influx section is required"))?;
            Ok(Arc::new(InfluxSeriesProvider::new(influx, years, labels)?))
        }
    }
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
