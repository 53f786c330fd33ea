//! Application layer.
//!
//! This module provides:
//! - The [`Backend`] facade used by a presentation layer or the CLI
//! - Tracing setup
//! - Prometheus metrics

mod backend;
pub mod metrics;
mod observability;

pub use backend::{Backend, FolderPicker};
pub use metrics::init_metrics;
pub use observability::{init_tracing, TracingConfig};
