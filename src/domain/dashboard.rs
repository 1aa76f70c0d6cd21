// Dashboard domain model
use crate::domain::device_status::DeviceCard;
use crate::domain::error::DashboardError;
use crate::domain::occupancy::{aggregate, OccupancyPoint, OccupancySummary};
use crate::domain::selection::{SelectionEvent, SelectionKey};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PanelStatus {
    Ready,
    NoData,
    Error { message: String },
}

/// Render-ready occupancy panel: the series and its summary always come from the same selection
#[derive(Debug, Clone, Serialize)]
pub struct PanelBundle {
    pub generation: u64,
    pub selection: SelectionKey,
    pub series_name: String,
    pub series: Vec<OccupancyPoint>,
    pub summary: Option<OccupancySummary>,
    pub status: PanelStatus,
    pub synthetic: bool,
}

impl PanelBundle {
    pub fn assemble(
        event: &SelectionEvent,
        series: Result<Vec<OccupancyPoint>, DashboardError>,
        synthetic: bool,
    ) -> Self {
        let (series, summary, status) = match series {
            Ok(points) => match aggregate(&points) {
                Ok(summary) => (points, Some(summary), PanelStatus::Ready),
                Err(DashboardError::EmptySeries) => (points, None, PanelStatus::NoData),
                Err(e) => (
                    points,
                    None,
                    PanelStatus::Error {
                        message: e.to_string(),
                    },
                ),
            },
            Err(e) => (
                Vec::new(),
                None,
                PanelStatus::Error {
                    message: e.to_string(),
                },
            ),
        };

        Self {
            generation: event.generation,
            selection: event.key.clone(),
            series_name: event.key.series_name(),
            series,
            summary,
            status,
            synthetic,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub title: String,
    pub devices: Vec<DeviceCard>,
    pub years: Vec<String>,
    pub occupancy: PanelBundle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::occupancy::Granularity;

    fn event() -> SelectionEvent {
        SelectionEvent {
            generation: 4,
            key: SelectionKey::new("2024", Granularity::MonthlyInYear, 1),
        }
    }

    #[test]
    fn test_assemble_ready() {
        let points = vec![
            OccupancyPoint::new("1월", 3000),
            OccupancyPoint::new("2월", 4001),
        ];
        let bundle = PanelBundle::assemble(&event(), Ok(points), false);

        assert_eq!(bundle.generation, 4);
        assert_eq!(bundle.status, PanelStatus::Ready);
        assert_eq!(bundle.summary, Some(OccupancySummary { total: 7001, average: 3500 }));
        assert_eq!(bundle.series_name, "2024년 년간 재실인원");
    }

    #[test]
    fn test_assemble_empty_series_is_no_data() {
        let bundle = PanelBundle::assemble(&event(), Ok(Vec::new()), false);
        assert_eq!(bundle.status, PanelStatus::NoData);
        assert!(bundle.summary.is_none());
    }

    #[test]
    fn test_assemble_provider_error() {
        let bundle = PanelBundle::assemble(
            &event(),
            Err(DashboardError::Provider(anyhow::anyhow!("connection refused"))),
            false,
        );
        assert!(bundle.series.is_empty());
        assert!(bundle.summary.is_none());
        match bundle.status {
            PanelStatus::Error { message } => assert!(message.contains("connection refused")),
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(PanelStatus::NoData).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "no_data" }));
    }
}
