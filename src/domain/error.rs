// Error taxonomy shared by the dashboard core
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// Year, month or granularity outside the configured domain
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// Aggregation was asked to summarize zero points
    #[error("occupancy series is empty")]
    EmptySeries,

    #[error("occupancy provider failed: {0:#}")]
    Provider(#[from] anyhow::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("selection controller is not running")]
    ControllerUnavailable,
}

impl DashboardError {
    pub fn invalid_selection(message: impl Into<String>) -> Self {
        Self::InvalidSelection(message.into())
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
