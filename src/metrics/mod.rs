//! Metrics and observability module
//!
//! Exposes Prometheus-compatible counters and gauges for simulation runs.
//!
//! Key metrics exposed:
//! - Messages sent and send failures per flow
//! - Generator lifecycle transitions
//! - Latest congestion window per endpoint
//! - Drops per link observation point

pub mod exporter;
pub mod recorder;

pub use exporter::{install_recorder, render_metrics, MetricsError};
pub use recorder::{
    init_metrics, record_drop, record_generator_transition, record_message_sent,
    record_send_failure, record_window, RunTimer,
};
