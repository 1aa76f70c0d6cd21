// Selection state for the occupancy panel
use crate::domain::error::DashboardError;
use crate::domain::occupancy::{days_in_month, Granularity};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// (year, granularity) pair driving which occupancy series is displayed.
/// `month` picks the month shown by daily series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionKey {
    pub year: String,
    pub granularity: Granularity,
    pub month: u32,
}

impl SelectionKey {
    pub fn new(year: impl Into<String>, granularity: Granularity, month: u32) -> Self {
        Self {
            year: year.into(),
            granularity,
            month,
        }
    }

    pub fn year_number(&self) -> Result<i32, DashboardError> {
        parse_year(&self.year)
    }

    /// Number of points a complete series for this key holds
    pub fn bucket_count(&self) -> Result<u32, DashboardError> {
        match self.granularity {
            Granularity::MonthlyInYear => Ok(12),
            Granularity::DailyInMonth => {
                validate_month(self.month)?;
                days_in_month(self.year_number()?, self.month).ok_or_else(|| {
                    DashboardError::invalid_selection(format!(
                        "no calendar month {}-{:02}",
                        self.year, self.month
                    ))
                })
            }
        }
    }

    /// Chart legend, e.g. "2024년 월간 재실인원"
    pub fn series_name(&self) -> String {
        format!("{}년 {} 재실인원", self.year, self.granularity.period_label())
    }
}

pub fn validate_month(month: u32) -> Result<(), DashboardError> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(DashboardError::invalid_selection(format!(
            "month {} is outside 1..=12",
            month
        )))
    }
}

fn parse_year(year: &str) -> Result<i32, DashboardError> {
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DashboardError::invalid_selection(format!(
            "year '{}' is not a 4-digit year",
            year
        )));
    }
    year.parse::<i32>()
        .map_err(|_| DashboardError::invalid_selection(format!("year '{}' is not a number", year)))
}

/// Ordered list of selectable years, newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearList {
    years: Vec<String>,
}

impl YearList {
    /// `latest` down through `span - 1` prior years
    pub fn descending_from(latest: i32, span: usize) -> Self {
        let years = (0..span.max(1))
            .map(|offset| (latest - offset as i32).to_string())
            .collect();
        Self { years }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.years
    }

    pub fn latest(&self) -> &str {
        &self.years[0]
    }

    pub fn contains(&self, year: &str) -> bool {
        self.years.iter().any(|y| y == year)
    }

    pub fn validate(&self, year: &str) -> Result<(), DashboardError> {
        parse_year(year)?;
        if self.contains(year) {
            Ok(())
        } else {
            Err(DashboardError::invalid_selection(format!(
                "year {} is not selectable",
                year
            )))
        }
    }
}

/// Published after every successful mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionEvent {
    pub generation: u64,
    pub key: SelectionKey,
}

pub struct SelectionState {
    years: YearList,
    key: SelectionKey,
    generation: u64,
    tx: watch::Sender<SelectionEvent>,
}

impl SelectionState {
    pub fn new(years: YearList, initial: SelectionKey) -> Result<Self, DashboardError> {
        years.validate(&initial.year)?;
        validate_month(initial.month)?;

        let (tx, _) = watch::channel(SelectionEvent {
            generation: 0,
            key: initial.clone(),
        });

        Ok(Self {
            years,
            key: initial,
            generation: 0,
            tx,
        })
    }

    pub fn current(&self) -> &SelectionKey {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn event(&self) -> SelectionEvent {
        SelectionEvent {
            generation: self.generation,
            key: self.key.clone(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SelectionEvent> {
        self.tx.subscribe()
    }

    pub fn set_year(&mut self, year: &str) -> Result<SelectionEvent, DashboardError> {
        self.years.validate(year)?;
        self.key.year = year.to_string();
        Ok(self.publish())
    }

    pub fn set_granularity(&mut self, granularity: Granularity) -> SelectionEvent {
        self.key.granularity = granularity;
        self.publish()
    }

    pub fn set_month(&mut self, month: u32) -> Result<SelectionEvent, DashboardError> {
        validate_month(month)?;
        self.key.month = month;
        Ok(self.publish())
    }

    // Republishes even when the value is unchanged so callers can force a refresh.
    fn publish(&mut self) -> SelectionEvent {
        self.generation += 1;
        let event = self.event();
        tracing::debug!(
            generation = event.generation,
            year = %event.key.year,
            granularity = %event.key.granularity,
            month = event.key.month,
            "Selection changed"
        );
        self.tx.send_replace(event.clone());
        event
    }
}
