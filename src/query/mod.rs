//! Query layer
//!
//! Typed, read-only queries over the built store. Each function returns
//! `Serialize` rows; the HTTP server only wraps them in a response envelope.
//!
//! # Overview
//!
//! - `Limit` - Bounds-checked row limit (1..=1000)
//! - `QueryContext` - Borough and anomaly settings from configuration
//! - One function per endpoint (`top_pickup_zones`, `hourly_demand`, ...)

mod limit;
mod queries;
mod types;

pub use limit::Limit;
pub use queries::*;
pub use types::*;
