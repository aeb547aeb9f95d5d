//! Shared error type for backend collaborators.

use thiserror::Error;

/// Errors emitted by backend calls.
///
/// The backend contract is plain request/response: any non-2xx status is a
/// failure, with the message derived from the status. No structured error
/// body is parsed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("backend request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
