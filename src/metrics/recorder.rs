//! Metrics recorder for simulation runs
//!
//! Thin wrappers over the `metrics` facade. Without an installed recorder
//! every call is a no-op.

use crate::generator::GeneratorState;
use crate::link::DropReason;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return; // Already initialized
    }

    describe_counter!(
        "congestion_messages_sent_total",
        "Messages handed to an endpoint by a traffic generator"
    );
    describe_counter!(
        "congestion_bytes_sent_total",
        "Bytes handed to an endpoint by a traffic generator"
    );
    describe_counter!(
        "congestion_send_failures_total",
        "Messages the endpoint rejected"
    );
    describe_counter!(
        "congestion_generator_transitions_total",
        "Generator lifecycle transitions by target state"
    );
    describe_counter!(
        "congestion_window_samples_total",
        "Congestion window changes observed"
    );
    describe_gauge!(
        "congestion_window_bytes",
        "Most recently observed congestion window"
    );
    describe_counter!(
        "congestion_drops_total",
        "Packets dropped at a link observation point"
    );
    describe_histogram!(
        "congestion_run_wall_seconds",
        "Wall-clock time spent running a scenario"
    );
}

// ============== Generator ==============

/// Record a message accepted by the endpoint
pub fn record_message_sent(flow: &str, bytes: u32) {
    counter!("congestion_messages_sent_total", "flow" => flow.to_string()).increment(1);
    counter!("congestion_bytes_sent_total", "flow" => flow.to_string()).increment(bytes as u64);
}

/// Record a message the endpoint refused
pub fn record_send_failure(flow: &str) {
    counter!("congestion_send_failures_total", "flow" => flow.to_string()).increment(1);
}

pub fn record_generator_transition(flow: &str, state: GeneratorState) {
    counter!(
        "congestion_generator_transitions_total",
        "flow" => flow.to_string(),
        "state" => format!("{state:?}")
    )
    .increment(1);
}

// ============== Instrumentation ==============

pub fn record_window(source: &str, window: u32) {
    counter!("congestion_window_samples_total", "source" => source.to_string()).increment(1);
    gauge!("congestion_window_bytes", "source" => source.to_string()).set(window as f64);
}

pub fn record_drop(link: &str, reason: DropReason) {
    counter!(
        "congestion_drops_total",
        "link" => link.to_string(),
        "reason" => reason.as_str()
    )
    .increment(1);
}

/// Times a scenario run in wall-clock terms
pub struct RunTimer {
    start_time: Instant,
}

impl RunTimer {
    pub fn start() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Stop timing and record the duration
    pub fn stop(self) -> Duration {
        let elapsed = self.start_time.elapsed();
        histogram!("congestion_run_wall_seconds").record(elapsed.as_secs_f64());
        elapsed
    }
}
