use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Endpoint is not bound")]
    NotBound,

    #[error("Endpoint already bound to {0}")]
    AlreadyBound(SocketAddr),

    #[error("Endpoint is not connected")]
    NotConnected,

    #[error("Endpoint already connected to {0}")]
    AlreadyConnected(SocketAddr),

    #[error("Endpoint is closed")]
    Closed,

    #[error("Send rejected: {0}")]
    Rejected(String),
}

pub type TransportResult<T> = Result<T, TransportError>;
