// Bounded-random occupancy provider for demo runs
use crate::application::series_provider::{check_selection, OccupancySeriesProvider};
use crate::domain::error::DashboardError;
use crate::domain::occupancy::{Granularity, OccupancyPoint, SeriesLabels};
use crate::domain::selection::{SelectionKey, YearList};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::ops::Range;
use std::sync::Mutex;

pub const DAILY_COUNT_RANGE: Range<u64> = 100..400;
pub const MONTHLY_COUNT_RANGE: Range<u64> = 3000..11000;

/// Placeholder data only. Every series it returns is flagged synthetic.
pub struct SyntheticSeriesProvider {
    years: YearList,
    labels: SeriesLabels,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl SyntheticSeriesProvider {
    pub fn with_rng(years: YearList, labels: SeriesLabels, rng: impl RngCore + Send + 'static) -> Self {
        Self {
            years,
            labels,
            rng: Mutex::new(Box::new(rng)),
        }
    }

    pub fn seeded(years: YearList, labels: SeriesLabels, seed: u64) -> Self {
        Self::with_rng(years, labels, StdRng::seed_from_u64(seed))
    }

    pub fn from_os_rng(years: YearList, labels: SeriesLabels) -> Self {
        Self::with_rng(years, labels, StdRng::from_os_rng())
    }

    fn count_range(granularity: Granularity) -> Range<u64> {
        match granularity {
            Granularity::DailyInMonth => DAILY_COUNT_RANGE,
            Granularity::MonthlyInYear => MONTHLY_COUNT_RANGE,
        }
    }
}

#[async_trait]
impl OccupancySeriesProvider for SyntheticSeriesProvider {
    async fn generate_series(&self, key: &SelectionKey) -> Result<Vec<OccupancyPoint>, DashboardError> {
        let buckets = check_selection(&self.years, key)?;
        let range = Self::count_range(key.granularity);

        let counts: Vec<u64> = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            (0..buckets).map(|_| rng.random_range(range.clone())).collect()
        };

        tracing::debug!(
            year = %key.year,
            granularity = %key.granularity,
            points = counts.len(),
            "Generated synthetic occupancy series"
        );

        Ok(self.labels.points(key.granularity, counts))
    }

    fn is_synthetic(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(seed: u64) -> SyntheticSeriesProvider {
        SyntheticSeriesProvider::seeded(YearList::descending_from(2024, 24), SeriesLabels::default(), seed)
    }

    #[tokio::test]
    async fn test_daily_series_follows_calendar() {
        let provider = provider(7);

        let feb_leap = SelectionKey::new("2024", Granularity::DailyInMonth, 2);
        let points = provider.generate_series(&feb_leap).await.unwrap();
        assert_eq!(points.len(), 29);
        assert_eq!(points[0].label, "1일");
        assert_eq!(points[28].label, "29일");

        let feb = SelectionKey::new("2023", Granularity::DailyInMonth, 2);
        assert_eq!(provider.generate_series(&feb).await.unwrap().len(), 28);

        let jan = SelectionKey::new("2023", Granularity::DailyInMonth, 1);
        assert_eq!(provider.generate_series(&jan).await.unwrap().len(), 31);
    }

    #[tokio::test]
    async fn test_counts_stay_in_bounds() {
        let provider = provider(99);

        for _ in 0..20 {
            let daily = SelectionKey::new("2024", Granularity::DailyInMonth, 3);
            for point in provider.generate_series(&daily).await.unwrap() {
                assert!(DAILY_COUNT_RANGE.contains(&point.count), "{}", point.count);
            }

            let monthly = SelectionKey::new("2024", Granularity::MonthlyInYear, 3);
            let points = provider.generate_series(&monthly).await.unwrap();
            assert_eq!(points.len(), 12);
            for point in points {
                assert!(MONTHLY_COUNT_RANGE.contains(&point.count), "{}", point.count);
            }
        }
    }

    #[tokio::test]
    async fn test_seeded_output_is_reproducible() {
        let key = SelectionKey::new("2022", Granularity::MonthlyInYear, 1);
        let a = provider(42).generate_series(&key).await.unwrap();
        let b = provider(42).generate_series(&key).await.unwrap();
        assert_eq!(a, b);
        assert!(provider(42).is_synthetic());
    }

    #[tokio::test]
    async fn test_rejects_year_outside_list() {
        let key = SelectionKey::new("1990", Granularity::MonthlyInYear, 1);
        assert!(matches!(
            provider(1).generate_series(&key).await,
            Err(DashboardError::InvalidSelection(_))
        ));
    }
}
