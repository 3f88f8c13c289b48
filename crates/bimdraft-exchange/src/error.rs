//! Failures at the delegation boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DelegateError {
    #[error("export service request failed: {0}")]
    Transport(String),

    #[error("export service returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not decode export service response: {0}")]
    Decode(String),

    #[error("not supported by this export service: {0}")]
    Unsupported(String),

    #[error("could not encode export payload: {0}")]
    Encode(String),

    #[error("export job did not finish after {polls} progress polls")]
    PollLimit { polls: usize },
}

impl From<reqwest::Error> for DelegateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DelegateError::Decode(err.to_string())
        } else {
            DelegateError::Transport(err.to_string())
        }
    }
}
