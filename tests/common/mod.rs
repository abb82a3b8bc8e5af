//! Shared fixtures for integration tests

#![allow(dead_code)]

use bytes::Bytes;
use congestion_trace::generator::SendFailurePolicy;
use congestion_trace::link::LinkConfig;
use congestion_trace::scenario::{FlowConfig, ScenarioConfig};
use congestion_trace::sim::{DataRate, Scheduler, SimTime};
use congestion_trace::transport::{
    Endpoint, TransportError, TransportResult, WindowCallback, WindowPreset,
};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Accepts everything while open and remembers when each send happened.
pub struct RecordingEndpoint {
    scheduler: Scheduler,
    open: AtomicBool,
    sends: Mutex<Vec<SimTime>>,
}

impl RecordingEndpoint {
    pub fn new(scheduler: &Scheduler) -> Arc<Self> {
        Arc::new(Self {
            scheduler: scheduler.clone(),
            open: AtomicBool::new(false),
            sends: Mutex::new(Vec::new()),
        })
    }

    pub fn send_times(&self) -> Vec<SimTime> {
        self.sends.lock().clone()
    }
}

impl Endpoint for RecordingEndpoint {
    fn bind(&self) -> TransportResult<SocketAddr> {
        self.open.store(true, Ordering::SeqCst);
        Ok("10.0.0.2:49153".parse().unwrap())
    }

    fn connect(&self, _peer: SocketAddr) -> TransportResult<()> {
        Ok(())
    }

    fn send(&self, payload: Bytes) -> TransportResult<usize> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.sends.lock().push(self.scheduler.now());
        Ok(payload.len())
    }

    fn close(&self) -> TransportResult<()> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn subscribe_window_change(&self, _callback: WindowCallback) {}
}

pub fn sink_addr() -> SocketAddr {
    "10.0.0.1:8080".parse().unwrap()
}

pub fn flow(name: &str, route: &[&str], quota: u32, start_secs: f64, stop_secs: f64) -> FlowConfig {
    FlowConfig {
        name: name.to_string(),
        route: route.iter().map(|l| l.to_string()).collect(),
        local_ip: "10.0.0.2".parse().unwrap(),
        destination: sink_addr(),
        message_size: 1024,
        quota,
        rate: DataRate::from_mbps(1),
        start_secs,
        stop_secs,
        window: WindowPreset::Standard,
        trace_window: true,
        failure_policy: SendFailurePolicy::Halt,
    }
}

/// One sender over one 1 Mbps / 2 ms link.
pub fn single_flow(quota: u32, start_secs: f64, stop_secs: f64) -> ScenarioConfig {
    ScenarioConfig {
        links: vec![LinkConfig::point_to_point("a-b").traced()],
        flows: vec![flow("flow", &["a-b"], quota, start_secs, stop_secs)],
        stop_secs: 20.0,
        seed: 1,
    }
}

/// Two senders sharing a traced, slightly lossy `n3-n1` bottleneck with a
/// short queue.
pub fn shared_bottleneck(queue_packets: usize) -> ScenarioConfig {
    let mut app1 = flow("app1", &["n5-n3", "n3-n1", "n1-n0"], 1000, 1.0, 10.0);
    app1.window = WindowPreset::Standard;
    let mut app2 = flow("app2", &["n4-n3", "n3-n1", "n1-n2"], 2000, 1.0, 20.0);
    app2.window = WindowPreset::Scalable;

    ScenarioConfig {
        links: vec![
            LinkConfig::point_to_point("n5-n3"),
            LinkConfig::point_to_point("n4-n3"),
            LinkConfig::point_to_point("n3-n1")
                .with_queue(queue_packets)
                .with_error_rate(0.01)
                .traced(),
            LinkConfig::point_to_point("n1-n0"),
            LinkConfig::point_to_point("n1-n2"),
        ],
        flows: vec![app1, app2],
        stop_secs: 20.0,
        seed: 7,
    }
}
