use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketState {
    Unbound,
    Bound,
    Connected,
    Closed,
}

impl SocketState {
    pub fn is_open(&self) -> bool {
        matches!(self, SocketState::Bound | SocketState::Connected)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketStats {
    /// Messages accepted by `send`
    pub messages_accepted: u64,
    pub bytes_accepted: u64,
    /// Messages handed to the route
    pub messages_transmitted: u64,
    pub messages_acked: u64,
    pub messages_lost: u64,
    pub window_changes: u64,
}
