use crate::generator::GeneratorError;
use crate::sim::SimError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Invalid scenario: {0}")]
    Invalid(String),

    #[error("Flow {flow} routes over unknown link {link}")]
    UnknownLink { flow: String, link: String },

    #[error("Duplicate name: {0}")]
    Duplicate(String),

    #[error("Flow {flow} rejected: {source}")]
    Generator {
        flow: String,
        #[source]
        source: GeneratorError,
    },

    #[error("Scheduling error: {0}")]
    Schedule(#[from] SimError),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for ScenarioError {
    fn from(err: serde_json::Error) -> Self {
        ScenarioError::SerializationError(err.to_string())
    }
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;
