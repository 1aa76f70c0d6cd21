// Dashboard composer - Composition root for device cards and the occupancy panel
use crate::application::selection_controller::{self, SelectionChange, SelectionHandle};
use crate::application::series_provider::OccupancySeriesProvider;
use crate::application::stats_panel::StatsPanel;
use crate::domain::dashboard::{DashboardView, PanelBundle};
use crate::domain::device_status::{device_card, DeviceCard, DeviceCategory};
use crate::domain::error::DashboardError;
use crate::domain::selection::{validate_month, SelectionEvent, SelectionKey, SelectionState, YearList};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct DashboardComposer {
    title: String,
    devices: Arc<[DeviceCategory]>,
    years: YearList,
    selection: SelectionHandle,
    bundles: watch::Receiver<PanelBundle>,
    panel: StatsPanel,
}

impl DashboardComposer {
    /// Spawn the selection controller and stats panel, render the initial bundle.
    pub async fn start(
        title: String,
        devices: Vec<DeviceCategory>,
        years: YearList,
        initial: SelectionKey,
        provider: Arc<dyn OccupancySeriesProvider>,
    ) -> Result<Self, DashboardError> {
        let state = SelectionState::new(years.clone(), initial)?;
        let (selection, selections) = selection_controller::spawn(state);

        let panel = StatsPanel::new(provider);
        let bundles = panel.clone().spawn(selections).await;

        tracing::info!(
            devices = devices.len(),
            years = years.as_slice().len(),
            synthetic = panel.is_synthetic(),
            "Dashboard composed"
        );

        Ok(Self {
            title,
            devices: devices.into(),
            years,
            selection,
            bundles,
            panel,
        })
    }

    pub fn devices(&self) -> Vec<DeviceCard> {
        self.devices.iter().map(device_card).collect()
    }

    pub fn years(&self) -> &[String] {
        self.years.as_slice()
    }

    /// Latest published occupancy bundle
    pub fn occupancy(&self) -> PanelBundle {
        self.bundles.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PanelBundle> {
        self.bundles.clone()
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            title: self.title.clone(),
            devices: self.devices(),
            years: self.years.as_slice().to_vec(),
            occupancy: self.occupancy(),
        }
    }

    pub async fn select(&self, change: SelectionChange) -> Result<PanelBundle, DashboardError> {
        let mut bundles = self.bundles.clone();
        self.selection.apply_and_wait(change, &mut bundles).await
    }

    /// Render an explicit key without touching the shared selection
    pub async fn query(&self, key: SelectionKey) -> Result<PanelBundle, DashboardError> {
        self.years.validate(&key.year)?;
        validate_month(key.month)?;

        let event = SelectionEvent { generation: 0, key };
        Ok(self.panel.render(&event).await)
    }
}
