//! Point-to-point link fixture
//!
//! Links serialise packets at their data rate behind a drop-tail queue, add
//! propagation delay, and may corrupt packets on the receive side. Each link
//! is an observation point: drop subscribers are told about every packet it
//! discards.

pub mod link;
pub mod route;
pub mod types;

pub use link::{ErrorModel, Link};
pub use route::Route;
pub use types::{
    DeliveryCallback, Delivery, DropCallback, DropNotice, DropReason, LinkConfig, LinkStats,
    Packet,
};
