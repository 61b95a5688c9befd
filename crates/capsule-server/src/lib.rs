//! capsule-server
//!
//! HTTP surface of the time capsule service: axum router, TOML config,
//! tracing setup and error mapping.

pub mod api;
pub mod config;
pub mod error;
pub mod telemetry;
