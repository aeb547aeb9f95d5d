#![forbid(unsafe_code)]

pub mod assessment;
pub mod error;

pub use academ_core::Clock;

pub use assessment::{
    AssessmentReport, AssessmentWorkflow, Collaborators, StudyPlan, SubmitOutcome,
};
pub use error::AssessmentError;
