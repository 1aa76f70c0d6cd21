// Domain layer - Pure dashboard models and rules
pub mod dashboard;
pub mod device_status;
pub mod error;
pub mod occupancy;
pub mod selection;
