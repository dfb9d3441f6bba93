pub mod builder;
pub mod config;
pub mod error;
pub mod geo;
pub mod profiles;
pub mod report;
pub mod sources;
pub mod telemetry;
