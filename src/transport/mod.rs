//! Connection endpoints
//!
//! `Endpoint` is the seam between traffic generators and whatever transport
//! carries their messages. `SimSocket` is a small reference endpoint that
//! pushes messages over a `Route` and exposes a congestion window driven by a
//! pluggable `WindowModel`.

pub mod endpoint;
pub mod error;
pub mod socket;
pub mod types;
pub mod window;

pub use endpoint::{Endpoint, WindowCallback};
pub use error::{TransportError, TransportResult};
pub use socket::SimSocket;
pub use types::{SocketState, SocketStats};
pub use window::{AimdWindow, WindowModel, WindowPreset};
