use crate::link::DropReason;
use crate::sim::SimTime;
use serde::{Deserialize, Serialize};

/// A congestion-window change observed on one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSample {
    pub time: SimTime,
    /// Endpoint the sample was taken from
    pub source: String,
    pub old_window: u32,
    pub window: u32,
}

impl WindowSample {
    /// `<seconds>\t<window>`
    pub fn trace_line(&self) -> String {
        format!("{}\t{}", self.time.as_secs_f64(), self.window)
    }
}

/// A packet discarded at a link observation point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropEvent {
    pub time: SimTime,
    /// Link the drop was observed on
    pub source: String,
    pub reason: DropReason,
}

impl DropEvent {
    /// `RxDrop at <seconds>`
    pub fn trace_line(&self) -> String {
        format!("RxDrop at {}", self.time.as_secs_f64())
    }
}
