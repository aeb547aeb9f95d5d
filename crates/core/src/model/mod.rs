mod ids;
mod question;
mod session;

pub use ids::{ModuleId, QuestionId, StudentId, TopicId};
pub use question::{Difficulty, DifficultyParseError, OptionLetter, Question};
pub use session::{
    AnswerRecord, AssessmentMode, AssessmentSession, Evaluation, SessionError, SessionProgress,
    PASS_THRESHOLD, STANDARD_TARGET,
};
