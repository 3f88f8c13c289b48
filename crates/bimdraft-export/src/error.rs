use bimdraft_core::camera::CameraError;
use bimdraft_exchange::DelegateError;
use thiserror::Error;

pub const GENERIC_FAILURE: &str = "export service reported failure";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported export format '{0}' (expected svg, dxf or ifc)")]
    UnsupportedFormat(String),

    #[error("{format} export needs scene objects, got {input} input")]
    UnsupportedInput {
        format: &'static str,
        input: &'static str,
    },

    #[error("a camera is required to draw a scene")]
    MissingCamera,

    #[error("invalid camera: {0}")]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Delegation(#[from] DelegateError),

    #[error("{0}")]
    Rejected(String),

    #[error("export service returned an unusable payload: {0}")]
    Payload(String),
}

impl ExportError {
    /// `success = false` from the collaborator, with its message when it gave one.
    pub fn rejected(message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        ExportError::Rejected(message)
    }
}
