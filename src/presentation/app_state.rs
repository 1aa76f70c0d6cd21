// Application state for HTTP handlers
use crate::application::dashboard_composer::DashboardComposer;

#[derive(Clone)]
pub struct AppState {
    pub composer: DashboardComposer,
}
