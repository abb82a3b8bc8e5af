use crate::sim::types::SimTime;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Cannot schedule at {requested} before current time {now}")]
    InPast { requested: SimTime, now: SimTime },

    #[error("Invalid data rate: {0}")]
    InvalidDataRate(String),
}

pub type SimResult<T> = Result<T, SimError>;
