//! Self-paced traffic generator
//!
//! A generator sends fixed-size messages through an `Endpoint` at the pace
//! implied by its data rate, re-arming a single scheduler event after each
//! send until its quota is exhausted or it is stopped.

pub mod error;
pub mod generator;
pub mod types;

pub use error::{GeneratorError, GeneratorResult};
pub use generator::TrafficGenerator;
pub use types::{GeneratorConfig, GeneratorSnapshot, GeneratorState, SendFailurePolicy};
