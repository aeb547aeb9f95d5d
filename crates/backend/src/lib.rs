#![forbid(unsafe_code)]

pub mod contract;
pub mod error;
pub mod http;

pub use reqwest::StatusCode;

pub use contract::{
    AnswerEvaluator, AssessmentRecorder, AttemptRecord, FinalExamSource, InMemoryBackend,
    QuestionGenerator, RecordedAssessment, StudyCoach, StudyContext, TopicDirectory,
};
pub use error::ApiError;
pub use http::{StudentApi, StudentApiConfig, TeacherApiConfig};
