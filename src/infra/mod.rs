//! Infrastructure adapters and runtime bootstrap.

pub mod context;
pub mod error;
pub mod telemetry;
