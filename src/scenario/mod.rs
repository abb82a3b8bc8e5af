//! Scenario harness
//!
//! Describes a topology of links and flows, wires generators, endpoints and
//! tracers together on one scheduler, and runs it to a fixed stop time.

pub mod config;
pub mod error;
pub mod runner;
pub mod types;

pub use config::{FlowConfig, ScenarioConfig};
pub use error::{ScenarioError, ScenarioResult};
pub use runner::run_scenario;
pub use types::{FlowReport, LinkReport, ScenarioReport};
