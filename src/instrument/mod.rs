//! Instrumentation sinks
//!
//! Tracers subscribe to endpoint window changes and link drops, stamp them
//! with the current virtual time and pass them to an injected `Recorder`.
//! They never feed anything back into the simulation.

pub mod tracer;
pub mod recorder;
pub mod types;

pub use tracer::{DropTracer, WindowTracer};
pub use recorder::{FanoutRecorder, LineRecorder, MemoryRecorder, Recorder, TracingRecorder};
pub use types::{DropEvent, WindowSample};
