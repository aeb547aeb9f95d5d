use academ_core::model::{AnswerRecord, AssessmentSession};

/// Display aggregation over a completed session.
///
/// Snapshots everything the completion screen needs so enrichment and
/// rendering never reach back into live session state.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentReport {
    /// Final score as a 0-1 fraction.
    pub final_score: f64,
    pub passed: bool,
    /// Answered questions the backend labeled "easy".
    pub easy_questions: usize,
    /// Remaining answered questions, displayed as the hard bucket.
    pub hard_questions: usize,
    pub history: Vec<AnswerRecord>,
}

impl AssessmentReport {
    /// Build a report from a completed session; `None` while in progress.
    #[must_use]
    pub fn from_session(session: &AssessmentSession) -> Option<Self> {
        let final_score = session.final_score()?;
        let passed = session.passed()?;
        let answered = session.answered_count();
        let easy_questions = session
            .questions()
            .iter()
            .take(answered)
            .filter(|q| q.difficulty.as_deref() == Some("easy"))
            .count();

        Some(Self {
            final_score,
            passed,
            easy_questions,
            hard_questions: answered - easy_questions,
            history: session.history().to_vec(),
        })
    }

    /// Final score as a percentage for display.
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.final_score * 100.0
    }
}
