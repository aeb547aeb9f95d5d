//! Shared error types for the services crate.

use thiserror::Error;

use academ_core::model::SessionError;
use backend::ApiError;

/// Errors emitted while driving an assessment.
///
/// The variants mirror the failure taxonomy of the flow: a start or
/// generation failure aborts the pending step and is manually retryable; an
/// evaluation failure leaves the session untouched so the same question can
/// be resubmitted. Post-completion soft failures (recording, topic lookup,
/// coaching) degrade inside the workflow and never surface here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssessmentError {
    #[error("no question is currently presented")]
    NoQuestion,
    #[error("assessment is not complete")]
    NotComplete,
    #[error("failed to load final exam questions: {0}")]
    Start(#[source] ApiError),
    #[error("failed to generate question: {0}")]
    Generate(#[source] ApiError),
    #[error("failed to evaluate answer: {0}")]
    Evaluate(#[source] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
