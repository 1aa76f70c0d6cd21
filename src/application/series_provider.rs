// Provider trait for occupancy series access
use crate::domain::error::DashboardError;
use crate::domain::occupancy::OccupancyPoint;
use crate::domain::selection::{validate_month, SelectionKey, YearList};
use async_trait::async_trait;

#[async_trait]
pub trait OccupancySeriesProvider: Send + Sync {
    /// Ordered (label, count) points for the selected window
    async fn generate_series(&self, key: &SelectionKey) -> Result<Vec<OccupancyPoint>, DashboardError>;

    /// True when points are placeholder data rather than real telemetry
    fn is_synthetic(&self) -> bool {
        false
    }
}

/// Rejects keys outside the provider's year list and returns the expected point count
pub fn check_selection(years: &YearList, key: &SelectionKey) -> Result<u32, DashboardError> {
    years.validate(&key.year)?;
    validate_month(key.month)?;
    key.bucket_count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::occupancy::Granularity;

    #[test]
    fn test_check_selection() {
        let years = YearList::descending_from(2024, 5);

        let daily = SelectionKey::new("2023", Granularity::DailyInMonth, 2);
        assert_eq!(check_selection(&years, &daily).unwrap(), 28);

        let monthly = SelectionKey::new("2020", Granularity::MonthlyInYear, 6);
        assert_eq!(check_selection(&years, &monthly).unwrap(), 12);

        let too_old = SelectionKey::new("2019", Granularity::MonthlyInYear, 1);
        assert!(matches!(
            check_selection(&years, &too_old),
            Err(DashboardError::InvalidSelection(_))
        ));
    }
}
