use serde::Serialize;

use crate::error::ScanError;

/// Response shape shared by every operation.
///
/// Serializes as `{ "success": true, ...payload }` or
/// `{ "success": false, "error": "..." }`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Success {
        success: bool,
        #[serde(flatten)]
        payload: T,
    },
    Failure {
        success: bool,
        error: String,
        #[serde(skip)]
        status: u16,
    },
}

impl<T> Envelope<T> {
    pub fn success(payload: T) -> Self {
        Envelope::Success { success: true, payload }
    }

    pub fn failure(err: &ScanError) -> Self {
        Envelope::Failure { success: false, error: err.to_string(), status: err.status_code() }
    }

    pub fn from_result(result: Result<T, ScanError>) -> Self {
        match result {
            Ok(payload) => Envelope::success(payload),
            Err(err) => Envelope::failure(&err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }

    pub fn status(&self) -> u16 {
        match self {
            Envelope::Success { .. } => 200,
            Envelope::Failure { status, .. } => *status,
        }
    }
}
