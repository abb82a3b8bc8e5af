use crate::transport::error::TransportResult;
use bytes::Bytes;
use std::net::SocketAddr;

/// Called with `(old_window, new_window)` whenever the congestion window changes.
pub type WindowCallback = Box<dyn FnMut(u32, u32) + Send + 'static>;

/// A connection-oriented transport endpoint.
///
/// Methods take `&self`; implementations keep their own interior state so a
/// generator and any number of observers can share one endpoint.
pub trait Endpoint: Send + Sync {
    /// Bind to a local address, returning it.
    fn bind(&self) -> TransportResult<SocketAddr>;

    fn connect(&self, peer: SocketAddr) -> TransportResult<()>;

    /// Hand a whole message to the transport. Returns the bytes accepted.
    fn send(&self, payload: Bytes) -> TransportResult<usize>;

    fn close(&self) -> TransportResult<()>;

    fn is_open(&self) -> bool;

    /// Register a window-change observer. Observers run synchronously, in
    /// registration order, on the scheduler's callback path.
    fn subscribe_window_change(&self, callback: WindowCallback);
}
