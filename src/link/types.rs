use crate::sim::{DataRate, Scheduler, SimTime};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropReason {
    /// Drop-tail queue was full when the packet arrived
    QueueOverflow,
    /// Receive-side error model corrupted the packet
    ReceiveError,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::QueueOverflow => "queue_overflow",
            DropReason::ReceiveError => "receive_error",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque message travelling over a link.
#[derive(Debug, Clone)]
pub struct Packet {
    pub flow: String,
    pub sequence: u64,
    pub payload: Bytes,
}

impl Packet {
    pub fn new(flow: impl Into<String>, sequence: u64, payload: Bytes) -> Self {
        Self {
            flow: flow.into(),
            sequence,
            payload,
        }
    }

    pub fn size(&self) -> u32 {
        u32::try_from(self.payload.len()).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Dropped(DropReason),
}

/// What a drop subscriber is told.
#[derive(Debug, Clone)]
pub struct DropNotice {
    pub link: String,
    pub reason: DropReason,
    pub flow: String,
    pub sequence: u64,
    pub size: u32,
    pub time: SimTime,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStats {
    pub packets_offered: u64,
    pub packets_delivered: u64,
    pub bytes_delivered: u64,
    pub queue_drops: u64,
    pub receive_errors: u64,
    pub max_queue_depth: usize,
}

impl LinkStats {
    pub fn total_drops(&self) -> u64 {
        self.queue_drops + self.receive_errors
    }
}

pub type DropCallback = Box<dyn FnMut(&DropNotice) + Send + 'static>;

/// Invoked once per packet with its fate on this hop.
pub type DeliveryCallback = Box<dyn FnOnce(&Scheduler, Packet, Delivery) + Send + 'static>;

/// Link parameters as they appear in scenario files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub name: String,
    #[serde(default = "default_rate")]
    pub rate: DataRate,
    /// One-way propagation delay in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: f64,
    /// Drop-tail capacity in packets, including the one being serialised
    #[serde(default = "default_queue_packets")]
    pub queue_packets: usize,
    /// Probability that the receiver discards a packet (0.0 - 1.0)
    #[serde(default)]
    pub error_rate: f64,
    /// Whether drops on this link are reported to the trace
    #[serde(default)]
    pub trace_drops: bool,
}

fn default_rate() -> DataRate {
    DataRate::from_mbps(1)
}

fn default_delay_ms() -> f64 {
    2.0
}

fn default_queue_packets() -> usize {
    100
}

impl LinkConfig {
    /// 1 Mbps, 2 ms, 100-packet queue, no errors.
    pub fn point_to_point(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rate: default_rate(),
            delay_ms: default_delay_ms(),
            queue_packets: default_queue_packets(),
            error_rate: 0.0,
            trace_drops: false,
        }
    }

    pub fn with_rate(mut self, rate: DataRate) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_queue(mut self, packets: usize) -> Self {
        self.queue_packets = packets;
        self
    }

    pub fn with_error_rate(mut self, rate: f64) -> Self {
        self.error_rate = rate;
        self
    }

    pub fn traced(mut self) -> Self {
        self.trace_drops = true;
        self
    }

    pub fn delay(&self) -> SimTime {
        SimTime::from_secs_f64(self.delay_ms / 1000.0)
    }
}
