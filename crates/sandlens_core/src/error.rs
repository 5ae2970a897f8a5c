use thiserror::Error;

use crate::exec::ExecError;

pub type ScanResult<T> = Result<T, ScanError>;

/// Failures that abort a whole operation.
///
/// Per-file and per-log problems never show up here; they are absorbed
/// where they happen and only visible as missing data.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("No active sandbox")]
    NoActiveSandbox,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to list files (find exited with {exit_code})")]
    DiscoveryFailed { exit_code: i32 },

    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl ScanError {
    /// HTTP-style status reported in the failure envelope
    pub fn status_code(&self) -> u16 {
        match self {
            ScanError::NoActiveSandbox => 404,
            ScanError::InvalidRequest(_) => 400,
            ScanError::DiscoveryFailed { .. } | ScanError::Exec(_) => 500,
        }
    }
}
