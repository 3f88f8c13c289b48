use serde::Serialize;

/// Lifecycle of a single export call:
/// `Idle -> Preparing -> (Serializing | Delegating) -> (Success | Error)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportState {
    Idle,
    Preparing,
    Serializing,
    Delegating,
    Success,
    Error,
}

impl ExportState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExportState::Success | ExportState::Error)
    }

    pub fn can_advance_to(self, next: ExportState) -> bool {
        use ExportState::*;
        match (self, next) {
            (_, Idle) => true,
            (Idle, Preparing) => true,
            (Preparing, Serializing | Delegating | Error) => true,
            (Serializing | Delegating, Success | Error) => true,
            _ => false,
        }
    }
}
