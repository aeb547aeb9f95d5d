mod report;
mod workflow;

pub use report::AssessmentReport;
pub use workflow::{AssessmentWorkflow, Collaborators, StudyPlan, SubmitOutcome};
