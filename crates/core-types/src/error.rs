use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Observation dates must be strictly increasing (violated at index {0})")]
    UnorderedObservations(usize),
}
