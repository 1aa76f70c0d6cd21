// Deterministic occupancy provider backed by preset counts
use crate::application::series_provider::{check_selection, OccupancySeriesProvider};
use crate::domain::error::DashboardError;
use crate::domain::occupancy::{Granularity, OccupancyPoint, SeriesLabels};
use crate::domain::selection::{SelectionKey, YearList};
use async_trait::async_trait;

/// Returns the same counts for every selection of a granularity.
/// Series length is the preset length, not the calendar length.
#[derive(Debug, Clone)]
pub struct FixedSeriesProvider {
    years: YearList,
    labels: SeriesLabels,
    daily: Vec<u64>,
    monthly: Vec<u64>,
}

impl FixedSeriesProvider {
    pub fn new(years: YearList, labels: SeriesLabels, daily: Vec<u64>, monthly: Vec<u64>) -> Self {
        Self {
            years,
            labels,
            daily,
            monthly,
        }
    }
}

#[async_trait]
impl OccupancySeriesProvider for FixedSeriesProvider {
    async fn generate_series(&self, key: &SelectionKey) -> Result<Vec<OccupancyPoint>, DashboardError> {
        check_selection(&self.years, key)?;

        let counts = match key.granularity {
            Granularity::DailyInMonth => &self.daily,
            Granularity::MonthlyInYear => &self.monthly,
        };
        Ok(self.labels.points(key.granularity, counts.iter().copied()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::occupancy::{aggregate, OccupancySummary};

    fn provider() -> FixedSeriesProvider {
        FixedSeriesProvider::new(
            YearList::descending_from(2024, 3),
            SeriesLabels::default(),
            vec![100, 150, 200],
            vec![],
        )
    }

    #[tokio::test]
    async fn test_fixed_counts_aggregate_exactly() {
        let key = SelectionKey::new("2024", Granularity::DailyInMonth, 5);
        let points = provider().generate_series(&key).await.unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[2], OccupancyPoint::new("3일", 200));
        assert_eq!(aggregate(&points).unwrap(), OccupancySummary { total: 450, average: 150 });
    }

    #[tokio::test]
    async fn test_empty_preset_yields_empty_series() {
        let key = SelectionKey::new("2023", Granularity::MonthlyInYear, 1);
        let points = provider().generate_series(&key).await.unwrap();
        assert!(points.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_unknown_year() {
        let key = SelectionKey::new("2020", Granularity::DailyInMonth, 1);
        assert!(matches!(
            provider().generate_series(&key).await,
            Err(DashboardError::InvalidSelection(_))
        ));
    }
}
