use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use crate::model::{Difficulty, ModuleId, OptionLetter, Question, QuestionId, TopicId};

/// Fixed question target for a standard adaptive quiz.
pub const STANDARD_TARGET: usize = 6;

/// Minimum final score (0-1) required to pass; the boundary is inclusive.
pub const PASS_THRESHOLD: f64 = 0.6;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("final exam has no questions")]
    EmptyFinalExam,
    #[error("assessment already completed")]
    Completed,
    #[error("no question is loaded at the current position")]
    NoCurrentQuestion,
    #[error("questions cannot be appended in final-exam mode")]
    FinalModeAppend,
}

//
// ─── MODE ──────────────────────────────────────────────────────────────────────
//

/// How a session sources its questions.
///
/// `Standard` quizzes generate one question at a time toward a fixed target;
/// `Final` exams load a pre-authored set up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentMode {
    Standard,
    Final,
}

impl AssessmentMode {
    /// Infer the mode from module naming.
    ///
    /// Legacy heuristic kept for callers whose curriculum source does not
    /// supply an explicit mode: a module id containing "final" or a module
    /// name containing "assessment" (case-insensitive) selects `Final`.
    /// Prefer passing the mode explicitly where the caller knows it.
    #[must_use]
    pub fn infer(module_id: &ModuleId, module_name: &str) -> Self {
        let id = module_id.as_str().to_lowercase();
        let name = module_name.to_lowercase();
        if id.contains("final") || name.contains("assessment") {
            AssessmentMode::Final
        } else {
            AssessmentMode::Standard
        }
    }
}

//
// ─── ANSWER RECORD ─────────────────────────────────────────────────────────────
//

/// Grading outcome for one submitted answer, as returned by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub is_correct: bool,
    pub feedback: String,
}

/// One answered question, snapshotted into the session history.
///
/// Carries the question/topic identifiers so post-completion consumers never
/// need to index back into the question list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    /// Formatted question text exactly as sent for grading.
    pub question: String,
    pub answer: OptionLetter,
    pub feedback: String,
    pub correct: bool,
    pub question_id: Option<QuestionId>,
    pub topic_id: Option<TopicId>,
}

/// Summary of how far a session has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state machine for one assessment attempt.
///
/// A session exists only while an attempt is underway: construction is the
/// start transition, and a retake discards the old session for a fresh one.
/// It advances solely through [`push_question`](Self::push_question) and
/// [`record_answer`](Self::record_answer); a failed grading call is applied
/// nowhere, so the same question stays answerable.
///
/// Invariants held after every transition:
/// - `history.len() == answered_count()` and never exceeds the target
/// - `score <= history.len()`, equal to the count of correct entries
/// - complete exactly when the cursor reaches the target
pub struct AssessmentSession {
    mode: AssessmentMode,
    questions: Vec<Question>,
    current: usize,
    score: u32,
    next_difficulty: Difficulty,
    history: Vec<AnswerRecord>,
    target: usize,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl AssessmentSession {
    /// Start a standard adaptive quiz: 6 questions, generated one at a time,
    /// first request at medium difficulty.
    #[must_use]
    pub fn standard(started_at: DateTime<Utc>) -> Self {
        Self {
            mode: AssessmentMode::Standard,
            questions: Vec::new(),
            current: 0,
            score: 0,
            next_difficulty: Difficulty::Medium,
            history: Vec::new(),
            target: STANDARD_TARGET,
            started_at,
            completed_at: None,
        }
    }

    /// Start a final exam over a pre-loaded question set; the target is the
    /// set's length.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyFinalExam` if the set is empty. An empty
    /// set would make every score a division by zero, so it is rejected here
    /// rather than propagated.
    pub fn final_exam(
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::EmptyFinalExam);
        }
        let target = questions.len();
        Ok(Self {
            mode: AssessmentMode::Final,
            questions,
            current: 0,
            score: 0,
            next_difficulty: Difficulty::Medium,
            history: Vec::new(),
            target,
            started_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn mode(&self) -> AssessmentMode {
        self.mode
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current >= self.target
    }

    /// Target question count: the loaded set length for final exams, the
    /// fixed standard target otherwise.
    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.target
    }

    /// Number of questions answered so far.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.history.len()
    }

    /// Count of correct answers so far.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Difficulty to request for the next generated question.
    #[must_use]
    pub fn next_difficulty(&self) -> Difficulty {
        self.next_difficulty
    }

    #[must_use]
    pub fn history(&self) -> &[AnswerRecord] {
        &self.history
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.target,
            answered: self.answered_count(),
            remaining: self.target.saturating_sub(self.current),
            is_complete: self.is_complete(),
        }
    }

    /// True when a standard session has caught up with its loaded questions
    /// and needs the next one generated.
    #[must_use]
    pub fn needs_question(&self) -> bool {
        self.mode == AssessmentMode::Standard
            && !self.is_complete()
            && self.current >= self.questions.len()
    }

    /// The question currently awaiting an answer, if one is loaded.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_complete() {
            return None;
        }
        self.questions.get(self.current)
    }

    /// Append a freshly generated question. Standard mode only; the question
    /// list is append-only and final-exam sets are loaded once at start.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::FinalModeAppend` in final mode and
    /// `SessionError::Completed` once the session is finished.
    pub fn push_question(&mut self, question: Question) -> Result<(), SessionError> {
        if self.mode == AssessmentMode::Final {
            return Err(SessionError::FinalModeAppend);
        }
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        self.questions.push(question);
        Ok(())
    }

    /// Apply a graded answer to the current question: one atomic transition.
    ///
    /// Appends the history entry, bumps the score iff correct, sets the next
    /// requested difficulty (hard after a correct answer, easy after an
    /// incorrect one; standard mode only), and advances the cursor. The
    /// session completes when the cursor reaches the target.
    ///
    /// The evaluation is an input here, so a failed grading call never
    /// touches the session and the same question can be resubmitted.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session is already finished,
    /// or `SessionError::NoCurrentQuestion` if no question is loaded at the
    /// current position.
    pub fn record_answer(
        &mut self,
        answer: OptionLetter,
        evaluation: Evaluation,
        answered_at: DateTime<Utc>,
    ) -> Result<&AnswerRecord, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        let Some(question) = self.questions.get(self.current) else {
            return Err(SessionError::NoCurrentQuestion);
        };

        self.history.push(AnswerRecord {
            question: question.format_text(),
            answer,
            feedback: evaluation.feedback,
            correct: evaluation.is_correct,
            question_id: question.question_id.clone(),
            topic_id: question.topic_id.clone(),
        });

        if evaluation.is_correct {
            self.score += 1;
        }
        if self.mode == AssessmentMode::Standard {
            self.next_difficulty = if evaluation.is_correct {
                Difficulty::Hard
            } else {
                Difficulty::Easy
            };
        }

        self.current += 1;
        if self.current >= self.target {
            self.completed_at = Some(answered_at);
        }

        self.history.last().ok_or(SessionError::Completed)
    }

    /// Final score as a 0-1 fraction, available once the session completes.
    #[must_use]
    pub fn final_score(&self) -> Option<f64> {
        self.is_complete()
            .then(|| f64::from(self.score) / self.target as f64)
    }

    /// Whether the completed session met the pass threshold (inclusive).
    #[must_use]
    pub fn passed(&self) -> Option<bool> {
        self.final_score().map(|score| score >= PASS_THRESHOLD)
    }

    /// Distinct topic ids attached to incorrectly answered questions, in
    /// first-seen order. These are the weak areas surfaced for remediation.
    #[must_use]
    pub fn weak_topics(&self) -> Vec<TopicId> {
        let mut topics: Vec<TopicId> = Vec::new();
        for record in &self.history {
            if record.correct {
                continue;
            }
            if let Some(topic) = &record.topic_id {
                if !topics.contains(topic) {
                    topics.push(topic.clone());
                }
            }
        }
        topics
    }
}

impl fmt::Debug for AssessmentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssessmentSession")
            .field("mode", &self.mode)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("next_difficulty", &self.next_difficulty)
            .field("target", &self.target)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn build_question(id: u32) -> Question {
        Question::new(format!("Q{id}"))
            .with_id(QuestionId::new(format!("q-{id}")))
            .with_options(["a", "b", "c", "d"])
    }

    fn correct() -> Evaluation {
        Evaluation {
            is_correct: true,
            feedback: "Correct.".into(),
        }
    }

    fn incorrect() -> Evaluation {
        Evaluation {
            is_correct: false,
            feedback: "Incorrect.".into(),
        }
    }

    fn answer_loaded(session: &mut AssessmentSession, evaluation: Evaluation) {
        if session.needs_question() {
            let next = build_question(session.answered_count() as u32 + 1);
            session.push_question(next).unwrap();
        }
        session
            .record_answer(OptionLetter::A, evaluation, fixed_now())
            .unwrap();
    }

    #[test]
    fn mode_inferred_from_module_naming() {
        let standard = ModuleId::new("btech_ds_u1");
        let final_id = ModuleId::new("btech_ds_final_exam");
        assert_eq!(
            AssessmentMode::infer(&standard, "Unit 1"),
            AssessmentMode::Standard
        );
        assert_eq!(
            AssessmentMode::infer(&final_id, "Unit X"),
            AssessmentMode::Final
        );
        assert_eq!(
            AssessmentMode::infer(&standard, "End Assessment"),
            AssessmentMode::Final
        );
    }

    #[test]
    fn empty_final_exam_is_rejected() {
        let err = AssessmentSession::final_exam(Vec::new(), fixed_now()).unwrap_err();
        assert_eq!(err, SessionError::EmptyFinalExam);
    }

    #[test]
    fn standard_session_starts_at_medium_and_needs_a_question() {
        let session = AssessmentSession::standard(fixed_now());
        assert_eq!(session.next_difficulty(), Difficulty::Medium);
        assert_eq!(session.total_questions(), STANDARD_TARGET);
        assert!(session.needs_question());
        assert!(session.current_question().is_none());
        assert!(!session.is_complete());
    }

    #[test]
    fn history_tracks_cursor_and_score_tracks_correct_entries() {
        let mut session = AssessmentSession::standard(fixed_now());
        let pattern = [true, false, true, true, false, false];

        for (i, &is_correct) in pattern.iter().enumerate() {
            let evaluation = if is_correct { correct() } else { incorrect() };
            answer_loaded(&mut session, evaluation);

            assert_eq!(session.history().len(), i + 1);
            assert_eq!(session.answered_count(), i + 1);
            let correct_entries = session.history().iter().filter(|r| r.correct).count();
            assert_eq!(session.score() as usize, correct_entries);
            assert!(session.score() as usize <= session.history().len());
        }

        assert!(session.is_complete());
        assert_eq!(session.score(), 3);
    }

    #[test]
    fn difficulty_follows_the_last_answer_only() {
        let mut session = AssessmentSession::standard(fixed_now());

        answer_loaded(&mut session, correct());
        assert_eq!(session.next_difficulty(), Difficulty::Hard);

        answer_loaded(&mut session, incorrect());
        assert_eq!(session.next_difficulty(), Difficulty::Easy);

        answer_loaded(&mut session, correct());
        assert_eq!(session.next_difficulty(), Difficulty::Hard);
    }

    #[test]
    fn final_mode_keeps_backend_difficulty_labels() {
        let questions = vec![
            build_question(1).with_difficulty("hard"),
            build_question(2).with_difficulty("easy"),
        ];
        let mut session = AssessmentSession::final_exam(questions, fixed_now()).unwrap();

        session
            .record_answer(OptionLetter::A, correct(), fixed_now())
            .unwrap();
        // No adaptive stepping in final mode.
        assert_eq!(session.next_difficulty(), Difficulty::Medium);

        let err = session.push_question(build_question(3)).unwrap_err();
        assert_eq!(err, SessionError::FinalModeAppend);
    }

    #[test]
    fn all_correct_standard_run_passes_with_full_score() {
        let mut session = AssessmentSession::standard(fixed_now());
        for _ in 0..STANDARD_TARGET {
            answer_loaded(&mut session, correct());
        }

        assert!(session.is_complete());
        assert_eq!(session.score(), 6);
        assert_eq!(session.final_score(), Some(1.0));
        assert_eq!(session.passed(), Some(true));
        // The difficulty that would be requested for a seventh question.
        assert_eq!(session.next_difficulty(), Difficulty::Hard);
    }

    #[test]
    fn half_correct_standard_run_fails() {
        let mut session = AssessmentSession::standard(fixed_now());
        for _ in 0..3 {
            answer_loaded(&mut session, correct());
        }
        for _ in 0..3 {
            answer_loaded(&mut session, incorrect());
        }

        assert_eq!(session.score(), 3);
        assert_eq!(session.final_score(), Some(0.5));
        assert_eq!(session.passed(), Some(false));
    }

    #[test]
    fn pass_boundary_is_inclusive() {
        // 6 of 10 in a final exam is exactly the 0.6 threshold.
        let questions: Vec<Question> = (1..=10).map(build_question).collect();
        let mut session = AssessmentSession::final_exam(questions, fixed_now()).unwrap();

        for i in 0..10 {
            let evaluation = if i < 6 { correct() } else { incorrect() };
            session
                .record_answer(OptionLetter::A, evaluation, fixed_now())
                .unwrap();
        }

        assert_eq!(session.total_questions(), 10);
        assert_eq!(session.final_score(), Some(0.6));
        assert_eq!(session.passed(), Some(true));
    }

    #[test]
    fn completion_happens_exactly_at_the_target() {
        let mut session = AssessmentSession::standard(fixed_now());
        for i in 0..STANDARD_TARGET {
            assert!(!session.is_complete());
            assert!(session.completed_at().is_none());
            answer_loaded(&mut session, correct());
            assert_eq!(session.is_complete(), i + 1 == STANDARD_TARGET);
        }

        assert_eq!(session.completed_at(), Some(fixed_now()));
        let err = session
            .record_answer(OptionLetter::A, correct(), fixed_now())
            .unwrap_err();
        assert_eq!(err, SessionError::Completed);
    }

    #[test]
    fn record_answer_requires_a_loaded_question() {
        let mut session = AssessmentSession::standard(fixed_now());
        let err = session
            .record_answer(OptionLetter::A, correct(), fixed_now())
            .unwrap_err();
        assert_eq!(err, SessionError::NoCurrentQuestion);
        assert!(session.history().is_empty());
    }

    #[test]
    fn history_snapshots_formatted_text_and_identifiers() {
        let mut session = AssessmentSession::standard(fixed_now());
        let question = build_question(1).with_topic(TopicId::new("t-1"));
        session.push_question(question.clone()).unwrap();

        let record = session
            .record_answer(OptionLetter::B, incorrect(), fixed_now())
            .unwrap();
        assert_eq!(record.question, question.format_text());
        assert_eq!(record.answer, OptionLetter::B);
        assert_eq!(record.question_id, question.question_id);
        assert_eq!(record.topic_id, question.topic_id);
        assert!(!record.correct);
    }

    #[test]
    fn weak_topics_are_distinct_incorrect_topics_in_order() {
        let mut session = AssessmentSession::standard(fixed_now());
        let topics = [Some("t-2"), Some("t-1"), Some("t-2"), None, Some("t-3")];
        let outcomes = [false, false, false, false, true];

        for (i, (topic, &is_correct)) in topics.iter().zip(&outcomes).enumerate() {
            let mut question = build_question(i as u32 + 1);
            if let Some(topic) = topic {
                question = question.with_topic(TopicId::new(*topic));
            }
            session.push_question(question).unwrap();
            let evaluation = if is_correct { correct() } else { incorrect() };
            session
                .record_answer(OptionLetter::A, evaluation, fixed_now())
                .unwrap();
        }

        let weak = session.weak_topics();
        assert_eq!(
            weak,
            vec![TopicId::new("t-2"), TopicId::new("t-1")],
            "t-3 was answered correctly and the unlabeled question is skipped"
        );
    }

    #[test]
    fn fresh_session_starts_zeroed() {
        // A retake constructs a new session; nothing carries over.
        let mut old = AssessmentSession::standard(fixed_now());
        for _ in 0..STANDARD_TARGET {
            answer_loaded(&mut old, correct());
        }
        assert!(old.is_complete());

        let fresh = AssessmentSession::standard(fixed_now());
        assert_eq!(fresh.score(), 0);
        assert!(fresh.history().is_empty());
        assert_eq!(fresh.answered_count(), 0);
        assert!(!fresh.is_complete());
        assert_eq!(fresh.next_difficulty(), Difficulty::Medium);
    }

    #[test]
    fn progress_reflects_cursor() {
        let mut session = AssessmentSession::standard(fixed_now());
        answer_loaded(&mut session, correct());
        answer_loaded(&mut session, incorrect());

        let progress = session.progress();
        assert_eq!(progress.total, STANDARD_TARGET);
        assert_eq!(progress.answered, 2);
        assert_eq!(progress.remaining, 4);
        assert!(!progress.is_complete);
    }
}
