use crate::generator::types::GeneratorState;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeneratorError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Generator already configured")]
    AlreadyConfigured,

    #[error("Generator not configured")]
    NotConfigured,

    #[error("Generator already running")]
    DoubleStart,

    #[error("Generator cannot restart from {0:?}")]
    Finished(GeneratorState),

    #[error("Transport failure: {0}")]
    TransportFailure(#[from] crate::transport::TransportError),
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;
