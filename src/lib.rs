//! Congestion-window and drop tracing for self-paced traffic over a
//! discrete-event network model.

pub mod generator;
pub mod instrument;
pub mod link;
pub mod metrics;
pub mod scenario;
pub mod sim;
pub mod transport;
