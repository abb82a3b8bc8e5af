use crate::generator::GeneratorSnapshot;
use crate::link::LinkStats;
use crate::transport::SocketStats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowReport {
    pub generator: GeneratorSnapshot,
    pub socket: SocketStats,
    pub window_model: String,
    pub final_window: u32,
    /// Samples reported for this endpoint, zero unless it was traced
    pub window_samples: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkReport {
    pub name: String,
    pub traced: bool,
    pub stats: LinkStats,
    /// Drops reported to the trace from this link
    pub drops_observed: u64,
}

/// Outcome of one scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Unix timestamp of when the run finished
    pub generated_at: i64,
    pub sim_time_secs: f64,
    pub events_executed: u64,
    pub wall_time_ms: u64,
    pub flows: Vec<FlowReport>,
    pub links: Vec<LinkReport>,
}

impl ScenarioReport {
    pub fn flow(&self, name: &str) -> Option<&FlowReport> {
        self.flows.iter().find(|f| f.generator.name == name)
    }

    pub fn link(&self, name: &str) -> Option<&LinkReport> {
        self.links.iter().find(|l| l.name == name)
    }

    pub fn total_window_samples(&self) -> u64 {
        self.flows.iter().map(|f| f.window_samples).sum()
    }

    pub fn total_drops_observed(&self) -> u64 {
        self.links.iter().map(|l| l.drops_observed).sum()
    }
}
