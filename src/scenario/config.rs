use crate::generator::SendFailurePolicy;
use crate::link::LinkConfig;
use crate::scenario::error::{ScenarioError, ScenarioResult};
use crate::sim::DataRate;
use crate::transport::WindowPreset;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

const SINK_PORT: u16 = 8080;

/// Largest message a flow may send; each send allocates one payload.
pub const MAX_MESSAGE_SIZE: u32 = 16 * 1024 * 1024;

/// One traffic generator and the endpoint it drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    pub name: String,
    /// Link names from source to sink
    pub route: Vec<String>,
    pub local_ip: IpAddr,
    pub destination: SocketAddr,
    #[serde(default = "default_message_size")]
    pub message_size: u32,
    pub quota: u32,
    #[serde(default = "default_rate")]
    pub rate: DataRate,
    pub start_secs: f64,
    pub stop_secs: f64,
    #[serde(default)]
    pub window: WindowPreset,
    /// Report this endpoint's window changes to the trace
    #[serde(default)]
    pub trace_window: bool,
    #[serde(default)]
    pub failure_policy: SendFailurePolicy,
}

fn default_message_size() -> u32 {
    1024
}

fn default_rate() -> DataRate {
    DataRate::from_mbps(1)
}

/// Links, flows and run length of one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub links: Vec<LinkConfig>,
    pub flows: Vec<FlowConfig>,
    #[serde(default = "default_stop_secs")]
    pub stop_secs: f64,
    /// Seeds every link's error model
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_stop_secs() -> f64 {
    20.0
}

fn default_seed() -> u64 {
    1
}

impl Default for ScenarioConfig {
    /// Two senders behind `n3` sharing the `n3-n1` hop, sinks on `n0` and `n2`.
    fn default() -> Self {
        let links = ["n5-n3", "n4-n3", "n3-n1", "n1-n0", "n1-n2"]
            .into_iter()
            .map(LinkConfig::point_to_point)
            .map(|link| match link.name.as_str() {
                "n1-n0" | "n1-n2" => link.traced(),
                _ => link,
            })
            .collect();

        let flows = vec![
            FlowConfig {
                name: "app1".into(),
                route: vec!["n5-n3".into(), "n3-n1".into(), "n1-n0".into()],
                local_ip: IpAddr::V4(Ipv4Addr::new(10, 1, 5, 2)),
                destination: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 1, 1, 1)), SINK_PORT),
                message_size: default_message_size(),
                quota: 1000,
                rate: default_rate(),
                start_secs: 1.0,
                stop_secs: 10.0,
                window: WindowPreset::Standard,
                trace_window: false,
                failure_policy: SendFailurePolicy::default(),
            },
            FlowConfig {
                name: "app2".into(),
                route: vec!["n4-n3".into(), "n3-n1".into(), "n1-n2".into()],
                local_ip: IpAddr::V4(Ipv4Addr::new(10, 1, 4, 2)),
                destination: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 1, 2, 2)), SINK_PORT),
                message_size: default_message_size(),
                quota: 2000,
                rate: default_rate(),
                start_secs: 1.0,
                stop_secs: 20.0,
                window: WindowPreset::Standard,
                trace_window: true,
                failure_policy: SendFailurePolicy::default(),
            },
        ];

        Self {
            links,
            flows,
            stop_secs: default_stop_secs(),
            seed: default_seed(),
        }
    }
}

impl ScenarioConfig {
    pub fn from_json_str(json: &str) -> ScenarioResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> ScenarioResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> ScenarioResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check names, routes and times. Generator parameters are checked when
    /// the generators are configured.
    pub fn validate(&self) -> ScenarioResult<()> {
        if !self.stop_secs.is_finite() || self.stop_secs <= 0.0 {
            return Err(ScenarioError::Invalid(format!(
                "stop time must be positive, got {}",
                self.stop_secs
            )));
        }

        let mut link_names = HashSet::new();
        for link in &self.links {
            if !link_names.insert(link.name.as_str()) {
                return Err(ScenarioError::Duplicate(link.name.clone()));
            }
            if link.rate.is_zero() {
                return Err(ScenarioError::Invalid(format!(
                    "link {} has zero rate",
                    link.name
                )));
            }
            if !(0.0..=1.0).contains(&link.error_rate) {
                return Err(ScenarioError::Invalid(format!(
                    "link {} error rate {} outside [0, 1]",
                    link.name, link.error_rate
                )));
            }
            if !link.delay_ms.is_finite() || link.delay_ms < 0.0 {
                return Err(ScenarioError::Invalid(format!(
                    "link {} has negative delay",
                    link.name
                )));
            }
        }

        let mut flow_names = HashSet::new();
        for flow in &self.flows {
            if !flow_names.insert(flow.name.as_str()) {
                return Err(ScenarioError::Duplicate(flow.name.clone()));
            }
            if flow.route.is_empty() {
                return Err(ScenarioError::Invalid(format!(
                    "flow {} has an empty route",
                    flow.name
                )));
            }
            if let Some(link) = flow.route.iter().find(|l| !link_names.contains(l.as_str())) {
                return Err(ScenarioError::UnknownLink {
                    flow: flow.name.clone(),
                    link: link.clone(),
                });
            }
            if flow.message_size > MAX_MESSAGE_SIZE {
                return Err(ScenarioError::Invalid(format!(
                    "flow {} message size {} exceeds {} bytes",
                    flow.name, flow.message_size, MAX_MESSAGE_SIZE
                )));
            }
            if !flow.start_secs.is_finite() || flow.start_secs < 0.0 {
                return Err(ScenarioError::Invalid(format!(
                    "flow {} start time must be non-negative",
                    flow.name
                )));
            }
            if !flow.stop_secs.is_finite() || flow.stop_secs < flow.start_secs {
                return Err(ScenarioError::Invalid(format!(
                    "flow {} stops before it starts",
                    flow.name
                )));
            }
        }
        Ok(())
    }

    pub fn flow(&self, name: &str) -> Option<&FlowConfig> {
        self.flows.iter().find(|f| f.name == name)
    }

    /// Links whose drops are reported
    pub fn observation_points(&self) -> Vec<&str> {
        self.links
            .iter()
            .filter(|l| l.trace_drops)
            .map(|l| l.name.as_str())
            .collect()
    }
}
