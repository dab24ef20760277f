pub mod dashboard_api;
pub mod error;
pub mod live;
pub mod types;
