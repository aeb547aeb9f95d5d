use std::sync::Arc;

use tracing::{debug, warn};

use academ_core::Clock;
use academ_core::model::{
    AnswerRecord, AssessmentMode, AssessmentSession, ModuleId, OptionLetter, StudentId,
};
use backend::{
    AnswerEvaluator, AssessmentRecorder, AttemptRecord, FinalExamSource, InMemoryBackend,
    QuestionGenerator, StudyCoach, StudyContext, TopicDirectory,
};

use super::report::AssessmentReport;
use crate::error::AssessmentError;

/// Fallback coaching text when study-plan generation fails.
const STUDY_PLAN_FALLBACK: &str = "Could not generate study suggestions at this time.";

const COACH_INSTRUCTION: &str =
    "You are a study coach. Analyze the performance and provide actionable study recommendations.";

//
// ─── COLLABORATORS ─────────────────────────────────────────────────────────────
//

/// Backend collaborators the workflow drives, one per logical operation.
#[derive(Clone)]
pub struct Collaborators {
    pub questions: Arc<dyn QuestionGenerator>,
    pub finals: Arc<dyn FinalExamSource>,
    pub evaluator: Arc<dyn AnswerEvaluator>,
    pub recorder: Arc<dyn AssessmentRecorder>,
    pub topics: Arc<dyn TopicDirectory>,
    pub coach: Arc<dyn StudyCoach>,
}

impl Collaborators {
    /// Wire every collaborator to one HTTP client.
    #[must_use]
    pub fn http(api: backend::StudentApi) -> Self {
        let api = Arc::new(api);
        Self {
            questions: api.clone(),
            finals: api.clone(),
            evaluator: api.clone(),
            recorder: api.clone(),
            topics: api.clone(),
            coach: api,
        }
    }

    /// Wire every collaborator to one scripted in-memory backend.
    #[must_use]
    pub fn in_memory(stub: InMemoryBackend) -> Self {
        let stub = Arc::new(stub);
        Self {
            questions: stub.clone(),
            finals: stub.clone(),
            evaluator: stub.clone(),
            recorder: stub.clone(),
            topics: stub.clone(),
            coach: stub,
        }
    }
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Result of submitting one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub record: AnswerRecord,
    pub is_complete: bool,
    /// Present exactly when this submission completed the session. Returned
    /// regardless of whether recording succeeded, so the caller can refresh
    /// module-lock state either way.
    pub report: Option<AssessmentReport>,
    /// Whether the completed attempt was persisted by the recorder.
    pub recorded: bool,
}

/// Post-completion enrichment: resolved weak areas and a coaching message.
///
/// Purely additive display state; building one never mutates the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyPlan {
    pub weak_areas: Vec<String>,
    pub message: String,
}

//
// ─── WORKFLOW ──────────────────────────────────────────────────────────────────
//

/// Drives one student/module assessment against the backend collaborators.
///
/// The workflow owns the ambient identifiers and the collaborator handles;
/// the caller owns the [`AssessmentSession`] and passes it in by `&mut`,
/// which also rules out two submissions in flight for the same session.
#[derive(Clone)]
pub struct AssessmentWorkflow {
    clock: Clock,
    student_id: StudentId,
    module_id: ModuleId,
    module_name: String,
    mode_override: Option<AssessmentMode>,
    collaborators: Collaborators,
}

impl AssessmentWorkflow {
    #[must_use]
    pub fn new(
        clock: Clock,
        student_id: StudentId,
        module_id: ModuleId,
        module_name: impl Into<String>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            clock,
            student_id,
            module_id,
            module_name: module_name.into(),
            mode_override: None,
            collaborators,
        }
    }

    /// Force the session mode instead of inferring it from module naming.
    ///
    /// Curriculum sources that know whether a module is a final exam should
    /// always set this; the substring heuristic is a fallback.
    #[must_use]
    pub fn with_mode(mut self, mode: AssessmentMode) -> Self {
        self.mode_override = Some(mode);
        self
    }

    #[must_use]
    pub fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    #[must_use]
    pub fn module_id(&self) -> &ModuleId {
        &self.module_id
    }

    /// Mode this workflow will start sessions in.
    #[must_use]
    pub fn mode(&self) -> AssessmentMode {
        self.mode_override
            .unwrap_or_else(|| AssessmentMode::infer(&self.module_id, &self.module_name))
    }

    /// Start a fresh session. Also the retake operation: the previous
    /// session, if any, is simply dropped by the caller.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Start` if the final question set cannot be
    /// loaded, or a session error for an empty final set. No partially
    /// active session is ever produced: on failure there is no session.
    pub async fn start(&self) -> Result<AssessmentSession, AssessmentError> {
        let now = self.clock.now();
        match self.mode() {
            AssessmentMode::Standard => Ok(AssessmentSession::standard(now)),
            AssessmentMode::Final => {
                let questions = self
                    .collaborators
                    .finals
                    .final_questions(&self.module_id)
                    .await
                    .map_err(AssessmentError::Start)?;
                debug!(
                    module = %self.module_id,
                    count = questions.len(),
                    "loaded final exam set"
                );
                Ok(AssessmentSession::final_exam(questions, now)?)
            }
        }
    }

    /// Generate the next question if the session has caught up with its
    /// loaded list. No-op when a question is already presented, in final
    /// mode, or once complete.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Generate` if the backend call fails; the
    /// session is left unchanged and the call can be repeated.
    pub async fn ensure_question(
        &self,
        session: &mut AssessmentSession,
    ) -> Result<(), AssessmentError> {
        if !session.needs_question() {
            return Ok(());
        }
        let difficulty = session.next_difficulty();
        let question = self
            .collaborators
            .questions
            .generate(&self.student_id, &self.module_id, difficulty)
            .await
            .map_err(AssessmentError::Generate)?;
        debug!(%difficulty, "generated next question");
        session.push_question(question)?;
        Ok(())
    }

    /// Submit the selected option for the current question.
    ///
    /// Grades via the evaluator, then applies the answer as one atomic
    /// session transition. If this submission completes the session, the
    /// attempt is reported to the recorder; a recording failure is logged
    /// and reflected in [`SubmitOutcome::recorded`] but never blocks the
    /// already-complete result.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::NoQuestion` when nothing is presented, and
    /// `AssessmentError::Evaluate` if grading fails; in both cases the
    /// session is untouched and the same question stays answerable.
    pub async fn submit_answer(
        &self,
        session: &mut AssessmentSession,
        answer: OptionLetter,
    ) -> Result<SubmitOutcome, AssessmentError> {
        let Some(question) = session.current_question() else {
            return Err(AssessmentError::NoQuestion);
        };
        let question_text = question.format_text();
        let question_id = question.question_id.clone();

        let evaluation = self
            .collaborators
            .evaluator
            .evaluate(
                &self.student_id,
                &question_text,
                answer,
                question_id.as_ref(),
            )
            .await
            .map_err(AssessmentError::Evaluate)?;

        let record = session
            .record_answer(answer, evaluation, self.clock.now())?
            .clone();

        if !session.is_complete() {
            return Ok(SubmitOutcome {
                record,
                is_complete: false,
                report: None,
                recorded: false,
            });
        }

        let report = AssessmentReport::from_session(session).ok_or(AssessmentError::NotComplete)?;
        let recorded = self.record_attempt(session, &report).await;
        Ok(SubmitOutcome {
            record,
            is_complete: true,
            report: Some(report),
            recorded,
        })
    }

    /// Best-effort persistence of a completed attempt. Failures are logged,
    /// not retried, and never block the in-memory result.
    async fn record_attempt(&self, session: &AssessmentSession, report: &AssessmentReport) -> bool {
        let attempts: Vec<AttemptRecord> = session
            .history()
            .iter()
            .map(|record| AttemptRecord {
                question_id: record.question_id.clone(),
                student_answer: record.answer.as_str().to_string(),
                is_correct: record.correct,
            })
            .collect();

        match self
            .collaborators
            .recorder
            .record(
                &self.student_id,
                &self.module_id,
                report.final_score,
                report.passed,
                &attempts,
            )
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(module = %self.module_id, error = %err, "failed to record assessment");
                false
            }
        }
    }

    /// Build the post-completion study plan: weak topics resolved to names
    /// (raw id on lookup failure) and a coaching message from the AI tutor
    /// (fixed placeholder on failure). Reads the completed session only.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::NotComplete` if the session has not
    /// finished; the collaborator calls themselves only degrade.
    pub async fn study_plan(
        &self,
        session: &AssessmentSession,
    ) -> Result<StudyPlan, AssessmentError> {
        let (Some(final_score), Some(passed)) = (session.final_score(), session.passed()) else {
            return Err(AssessmentError::NotComplete);
        };

        let mut weak_areas = Vec::new();
        for topic in session.weak_topics() {
            match self.collaborators.topics.topic_name(&topic).await {
                Ok(name) => weak_areas.push(name),
                Err(err) => {
                    warn!(topic = %topic, error = %err, "topic lookup failed, keeping raw id");
                    weak_areas.push(topic.as_str().to_string());
                }
            }
        }

        let summary = if weak_areas.is_empty() {
            "None identified".to_string()
        } else {
            weak_areas.join(", ")
        };
        let prompt = format!(
            "Based on this assessment performance, provide 3 specific study tips or topics to \
             review. Be encouraging but direct. Score: {:.0}%. Passed: {passed}. Weak Areas: {summary}",
            final_score * 100.0
        );
        let context = StudyContext {
            module_id: self.module_id.clone(),
            system_instruction: Some(COACH_INSTRUCTION.to_string()),
        };

        let message = match self
            .collaborators
            .coach
            .advise(&self.student_id, &prompt, &context)
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "study plan generation failed, using fallback");
                STUDY_PLAN_FALLBACK.to_string()
            }
        };

        Ok(StudyPlan {
            weak_areas,
            message,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
