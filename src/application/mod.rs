// Application layer - Use cases wiring selection, series and summaries
pub mod dashboard_composer;
pub mod selection_controller;
pub mod series_provider;
pub mod stats_panel;
