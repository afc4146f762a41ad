//! # Utility Modules
//!
//! Supporting utilities shared by the node and the overlays.
//!
//! ## Components
//! - **Logging**: `tracing-subscriber` setup driven by [`crate::config::LoggingConfig`]
//! - **Metrics**: per-node atomic counters for codec traffic

pub mod logging;
pub mod metrics;

pub use metrics::{Metrics, MetricsSnapshot};
