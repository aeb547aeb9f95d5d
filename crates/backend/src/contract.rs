//! Collaborator contracts for the student-facing backend, plus an in-memory
//! implementation for tests and prototyping.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use academ_core::model::{
    Difficulty, Evaluation, ModuleId, OptionLetter, Question, QuestionId, StudentId, TopicId,
};

use crate::error::ApiError;

/// One answered question as reported to the recorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<QuestionId>,
    pub student_answer: String,
    pub is_correct: bool,
}

/// Context forwarded with a coaching request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyContext {
    pub module_id: ModuleId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
}

/// Generates the next adaptive question for a student/module pairing.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Fetch one question at the requested difficulty.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend call fails.
    async fn generate(
        &self,
        student: &StudentId,
        module: &ModuleId,
        difficulty: Difficulty,
    ) -> Result<Question, ApiError>;
}

/// Serves the fixed question set for a final-exam module.
#[async_trait]
pub trait FinalExamSource: Send + Sync {
    /// Fetch the full pre-authored question set for a module.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend call fails.
    async fn final_questions(&self, module: &ModuleId) -> Result<Vec<Question>, ApiError>;
}

/// Grades one submitted answer.
#[async_trait]
pub trait AnswerEvaluator: Send + Sync {
    /// Grade the selected option against the formatted question text.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend call fails.
    async fn evaluate(
        &self,
        student: &StudentId,
        question: &str,
        answer: OptionLetter,
        question_id: Option<&QuestionId>,
    ) -> Result<Evaluation, ApiError>;
}

/// Persists a completed assessment attempt.
#[async_trait]
pub trait AssessmentRecorder: Send + Sync {
    /// Record the final score (0-1), pass flag, and per-question attempts.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend call fails.
    async fn record(
        &self,
        student: &StudentId,
        module: &ModuleId,
        score: f64,
        passed: bool,
        attempts: &[AttemptRecord],
    ) -> Result<(), ApiError>;
}

/// Resolves topic ids to human-readable names.
#[async_trait]
pub trait TopicDirectory: Send + Sync {
    /// Look up the display name for a topic.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend call fails.
    async fn topic_name(&self, topic: &TopicId) -> Result<String, ApiError>;
}

/// Free-text AI tutor, reused for study-plan generation.
#[async_trait]
pub trait StudyCoach: Send + Sync {
    /// Request a natural-language response to `message` in the given context.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend call fails.
    async fn advise(
        &self,
        student: &StudentId,
        message: &str,
        context: &StudyContext,
    ) -> Result<String, ApiError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

/// A recorded attempt captured by [`InMemoryBackend`], for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAssessment {
    pub student: StudentId,
    pub module: ModuleId,
    pub score: f64,
    pub passed: bool,
    pub attempts: Vec<AttemptRecord>,
}

#[derive(Default)]
struct Inner {
    bank: HashMap<Difficulty, Vec<Question>>,
    served: HashMap<Difficulty, usize>,
    generate_log: Vec<Difficulty>,
    final_sets: HashMap<ModuleId, Vec<Question>>,
    by_id: HashMap<QuestionId, Question>,
    topics: HashMap<TopicId, String>,
    coach_reply: Option<String>,
    recorded: Vec<RecordedAssessment>,
}

/// Scripted in-memory backend for tests and prototyping.
///
/// Questions are served per difficulty in insertion order; grading compares
/// the selected option's text against the scripted `correct_answer`.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script one question into the generation bank at the given difficulty.
    #[must_use]
    pub fn with_question(self, difficulty: Difficulty, question: Question) -> Self {
        {
            let mut inner = self.lock();
            if let Some(id) = &question.question_id {
                inner.by_id.insert(id.clone(), question.clone());
            }
            inner.bank.entry(difficulty).or_default().push(question);
        }
        self
    }

    /// Script the fixed question set for a final-exam module.
    #[must_use]
    pub fn with_final_set(self, module: ModuleId, questions: Vec<Question>) -> Self {
        {
            let mut inner = self.lock();
            for question in &questions {
                if let Some(id) = &question.question_id {
                    inner.by_id.insert(id.clone(), question.clone());
                }
            }
            inner.final_sets.insert(module, questions);
        }
        self
    }

    /// Script a topic-id to display-name mapping.
    #[must_use]
    pub fn with_topic(self, topic: TopicId, name: impl Into<String>) -> Self {
        self.lock().topics.insert(topic, name.into());
        self
    }

    /// Script the coach's canned reply.
    #[must_use]
    pub fn with_coach_reply(self, reply: impl Into<String>) -> Self {
        self.lock().coach_reply = Some(reply.into());
        self
    }

    /// Assessments recorded so far.
    #[must_use]
    pub fn recorded(&self) -> Vec<RecordedAssessment> {
        self.lock().recorded.clone()
    }

    /// Difficulties requested through `generate`, in call order.
    #[must_use]
    pub fn generate_log(&self) -> Vec<Difficulty> {
        self.lock().generate_log.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl QuestionGenerator for InMemoryBackend {
    async fn generate(
        &self,
        _student: &StudentId,
        _module: &ModuleId,
        difficulty: Difficulty,
    ) -> Result<Question, ApiError> {
        let mut inner = self.lock();
        inner.generate_log.push(difficulty);
        let index = inner.served.get(&difficulty).copied().unwrap_or(0);
        let question = inner
            .bank
            .get(&difficulty)
            .and_then(|bank| bank.get(index))
            .cloned();
        match question {
            Some(question) => {
                *inner.served.entry(difficulty).or_insert(0) += 1;
                Ok(question)
            }
            None => Err(ApiError::HttpStatus(reqwest::StatusCode::NOT_FOUND)),
        }
    }
}

#[async_trait]
impl FinalExamSource for InMemoryBackend {
    async fn final_questions(&self, module: &ModuleId) -> Result<Vec<Question>, ApiError> {
        self.lock()
            .final_sets
            .get(module)
            .cloned()
            .ok_or(ApiError::HttpStatus(reqwest::StatusCode::NOT_FOUND))
    }
}

#[async_trait]
impl AnswerEvaluator for InMemoryBackend {
    async fn evaluate(
        &self,
        _student: &StudentId,
        _question: &str,
        answer: OptionLetter,
        question_id: Option<&QuestionId>,
    ) -> Result<Evaluation, ApiError> {
        let inner = self.lock();
        let Some(question) = question_id.and_then(|id| inner.by_id.get(id)) else {
            return Ok(Evaluation {
                is_correct: false,
                feedback: "Question not found.".into(),
            });
        };

        let chosen = question.option_for(answer);
        let is_correct = matches!(
            (&question.correct_answer, chosen),
            (Some(expected), Some(option)) if expected == option
        );
        Ok(Evaluation {
            is_correct,
            feedback: if is_correct {
                "Correct.".into()
            } else {
                "Incorrect.".into()
            },
        })
    }
}

#[async_trait]
impl AssessmentRecorder for InMemoryBackend {
    async fn record(
        &self,
        student: &StudentId,
        module: &ModuleId,
        score: f64,
        passed: bool,
        attempts: &[AttemptRecord],
    ) -> Result<(), ApiError> {
        self.lock().recorded.push(RecordedAssessment {
            student: student.clone(),
            module: module.clone(),
            score,
            passed,
            attempts: attempts.to_vec(),
        });
        Ok(())
    }
}

#[async_trait]
impl TopicDirectory for InMemoryBackend {
    async fn topic_name(&self, topic: &TopicId) -> Result<String, ApiError> {
        self.lock()
            .topics
            .get(topic)
            .cloned()
            .ok_or(ApiError::HttpStatus(reqwest::StatusCode::NOT_FOUND))
    }
}

#[async_trait]
impl StudyCoach for InMemoryBackend {
    async fn advise(
        &self,
        _student: &StudentId,
        _message: &str,
        _context: &StudyContext,
    ) -> Result<String, ApiError> {
        self.lock()
            .coach_reply
            .clone()
            .ok_or(ApiError::HttpStatus(reqwest::StatusCode::SERVICE_UNAVAILABLE))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> StudentId {
        StudentId::new("s-1")
    }

    fn module() -> ModuleId {
        ModuleId::new("ds-u1")
    }

    fn scripted_question(id: &str, correct_option: &str) -> Question {
        Question::new(format!("Prompt {id}"))
            .with_id(QuestionId::new(id))
            .with_options(["alpha", "beta", "gamma"])
            .with_correct_answer(correct_option)
    }

    #[tokio::test]
    async fn generate_serves_bank_in_order_and_logs_requests() {
        let backend = InMemoryBackend::new()
            .with_question(Difficulty::Medium, scripted_question("q-1", "alpha"))
            .with_question(Difficulty::Medium, scripted_question("q-2", "beta"));

        let first = backend
            .generate(&student(), &module(), Difficulty::Medium)
            .await
            .unwrap();
        let second = backend
            .generate(&student(), &module(), Difficulty::Medium)
            .await
            .unwrap();
        assert_eq!(first.question_id.unwrap().as_str(), "q-1");
        assert_eq!(second.question_id.unwrap().as_str(), "q-2");

        let exhausted = backend
            .generate(&student(), &module(), Difficulty::Medium)
            .await;
        assert!(matches!(
            exhausted,
            Err(ApiError::HttpStatus(reqwest::StatusCode::NOT_FOUND))
        ));
        assert_eq!(backend.generate_log(), vec![Difficulty::Medium; 3]);
    }

    #[tokio::test]
    async fn evaluate_grades_the_selected_option() {
        let backend =
            InMemoryBackend::new().with_question(Difficulty::Medium, scripted_question("q-1", "beta"));
        let question = scripted_question("q-1", "beta");
        let id = question.question_id.clone().unwrap();

        let right = backend
            .evaluate(&student(), &question.format_text(), OptionLetter::B, Some(&id))
            .await
            .unwrap();
        assert!(right.is_correct);

        let wrong = backend
            .evaluate(&student(), &question.format_text(), OptionLetter::A, Some(&id))
            .await
            .unwrap();
        assert!(!wrong.is_correct);
    }

    #[tokio::test]
    async fn record_captures_the_attempt() {
        let backend = InMemoryBackend::new();
        let attempts = vec![AttemptRecord {
            question_id: Some(QuestionId::new("q-1")),
            student_answer: "A".into(),
            is_correct: true,
        }];
        backend
            .record(&student(), &module(), 1.0, true, &attempts)
            .await
            .unwrap();

        let recorded = backend.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].attempts, attempts);
        assert!(recorded[0].passed);
    }

    #[tokio::test]
    async fn topic_lookup_misses_surface_as_not_found() {
        let backend = InMemoryBackend::new().with_topic(TopicId::new("t-1"), "Linked Lists");
        assert_eq!(
            backend.topic_name(&TopicId::new("t-1")).await.unwrap(),
            "Linked Lists"
        );
        assert!(backend.topic_name(&TopicId::new("t-9")).await.is_err());
    }
}
