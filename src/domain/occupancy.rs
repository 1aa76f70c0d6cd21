// Occupancy series domain model and aggregation
use crate::domain::error::DashboardError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Granularity {
    /// One point per day of the selected month
    #[serde(rename = "daily")]
    DailyInMonth,
    /// One point per month of the selected year
    #[serde(rename = "monthly")]
    MonthlyInYear,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::DailyInMonth => "daily",
            Granularity::MonthlyInYear => "monthly",
        }
    }

    /// Period caption used in the chart legend
    pub fn period_label(&self) -> &'static str {
        match self {
            Granularity::DailyInMonth => "월간",
            Granularity::MonthlyInYear => "년간",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "daily_in_month" => Ok(Granularity::DailyInMonth),
            "monthly" | "monthly_in_year" => Ok(Granularity::MonthlyInYear),
            other => Err(DashboardError::invalid_selection(format!(
                "unknown granularity '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Granularity {
    type Error = DashboardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyPoint {
    pub label: String,
    pub count: u64,
}

impl OccupancyPoint {
    pub fn new(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OccupancySummary {
    pub total: u64,
    pub average: u64,
}

/// Total and floor average of a series; an empty series is an error, never a division by zero.
pub fn aggregate(points: &[OccupancyPoint]) -> Result<OccupancySummary, DashboardError> {
    if points.is_empty() {
        return Err(DashboardError::EmptySeries);
    }

    let total: u64 = points.iter().map(|p| p.count).sum();
    let average = total / points.len() as u64;

    Ok(OccupancySummary { total, average })
}

/// Display suffixes appended to day and month indices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesLabels {
    #[serde(default = "default_day_suffix")]
    pub day_suffix: String,
    #[serde(default = "default_month_suffix")]
    pub month_suffix: String,
}

fn default_day_suffix() -> String {
    "일".to_string()
}

fn default_month_suffix() -> String {
    "월".to_string()
}

impl Default for SeriesLabels {
    fn default() -> Self {
        Self {
            day_suffix: default_day_suffix(),
            month_suffix: default_month_suffix(),
        }
    }
}

impl SeriesLabels {
    /// Label for the 1-based bucket `index` of a series
    pub fn label(&self, granularity: Granularity, index: u32) -> String {
        match granularity {
            Granularity::DailyInMonth => format!("{}{}", index, self.day_suffix),
            Granularity::MonthlyInYear => format!("{}{}", index, self.month_suffix),
        }
    }

    pub fn points(&self, granularity: Granularity, counts: impl IntoIterator<Item = u64>) -> Vec<OccupancyPoint> {
        counts
            .into_iter()
            .zip(1u32..)
            .map(|(count, index)| OccupancyPoint::new(self.label(granularity, index), count))
            .collect()
    }
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next.signed_duration_since(first).num_days() as u32)
}
