// Infrastructure layer - External dependencies and adapters
pub mod chunked_json;
pub mod config;
pub mod fixed_provider;
pub mod http_response;
pub mod influx_provider;
pub mod synthetic_provider;
