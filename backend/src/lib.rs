//! Lot lineage service
//!
//! Host-side layer around the lineage engine: pulls batch snapshots from a
//! record source, computes virtual batches and allocation plans, and pushes
//! plans to a record sink.

pub mod config;
pub mod error;
pub mod services;
pub mod store;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, AppResult};
