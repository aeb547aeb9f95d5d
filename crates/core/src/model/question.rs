use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::{QuestionId, TopicId};

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown difficulty label: {0}")]
pub struct DifficultyParseError(pub String);

/// Difficulty label requested for the next generated question.
///
/// Questions returned by the backend carry their own free-form difficulty
/// string; that label is kept verbatim on [`Question`] and never forced
/// through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Returns the lowercase wire label for this difficulty.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = DifficultyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(DifficultyParseError(s.to_string())),
        }
    }
}

//
// ─── OPTION LETTER ─────────────────────────────────────────────────────────────
//

/// Position-based label for an answer option (A through D).
///
/// A question carries at most four options; letters are assigned by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    /// All letters in positional order.
    pub const ALL: [OptionLetter; 4] = [
        OptionLetter::A,
        OptionLetter::B,
        OptionLetter::C,
        OptionLetter::D,
    ];

    /// Returns the letter as a bare string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionLetter::A => "A",
            OptionLetter::B => "B",
            OptionLetter::C => "C",
            OptionLetter::D => "D",
        }
    }

    /// Zero-based position of the labeled option.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            OptionLetter::A => 0,
            OptionLetter::B => 1,
            OptionLetter::C => 2,
            OptionLetter::D => 3,
        }
    }

    /// Returns the letter for a zero-based option position, if any.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One assessment item as served by the backend.
///
/// Immutable once received. Grading is delegated to the backend, so
/// `correct_answer` is never consulted client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<QuestionId>,
    #[serde(rename = "question")]
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<TopicId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
}

impl Question {
    /// Creates a question with only a prompt; everything else unset.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            question_id: None,
            prompt: prompt.into(),
            options: Vec::new(),
            correct_answer: None,
            difficulty: None,
            topic_id: None,
            chapter: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: QuestionId) -> Self {
        self.question_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_correct_answer(mut self, answer: impl Into<String>) -> Self {
        self.correct_answer = Some(answer.into());
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, label: impl Into<String>) -> Self {
        self.difficulty = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_topic(mut self, topic: TopicId) -> Self {
        self.topic_id = Some(topic);
        self
    }

    /// Returns the option text labeled by `letter`, if present.
    #[must_use]
    pub fn option_for(&self, letter: OptionLetter) -> Option<&str> {
        self.options.get(letter.index()).map(String::as_str)
    }

    /// Formats the full question text: the prompt followed by lettered
    /// options (`A) ...`, `B) ...`, ...), blank-line separated.
    ///
    /// This exact text is sent to the backend for grading and stored in the
    /// session history, so display and grading always agree.
    #[must_use]
    pub fn format_text(&self) -> String {
        let mut text = self.prompt.clone();
        for (letter, option) in OptionLetter::ALL.iter().zip(&self.options) {
            text.push_str("\n\n");
            text.push_str(letter.as_str());
            text.push_str(") ");
            text.push_str(option);
        }
        text
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(" easy ".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert!("brutal".parse::<Difficulty>().is_err());
    }

    #[test]
    fn difficulty_serializes_lowercase() {
        let json = serde_json::to_string(&Difficulty::Hard).unwrap();
        assert_eq!(json, "\"hard\"");
    }

    #[test]
    fn option_letters_map_to_positions() {
        assert_eq!(OptionLetter::from_index(0), Some(OptionLetter::A));
        assert_eq!(OptionLetter::from_index(3), Some(OptionLetter::D));
        assert_eq!(OptionLetter::from_index(4), None);
        assert_eq!(OptionLetter::C.index(), 2);
    }

    #[test]
    fn format_text_appends_lettered_options() {
        let question = Question::new("What is 2 + 2?").with_options(["3", "4", "5"]);
        assert_eq!(
            question.format_text(),
            "What is 2 + 2?\n\nA) 3\n\nB) 4\n\nC) 5"
        );
    }

    #[test]
    fn format_text_without_options_is_the_prompt() {
        let question = Question::new("Define a stack.");
        assert_eq!(question.format_text(), "Define a stack.");
    }

    #[test]
    fn option_for_resolves_by_position() {
        let question = Question::new("Q").with_options(["first", "second"]);
        assert_eq!(question.option_for(OptionLetter::B), Some("second"));
        assert_eq!(question.option_for(OptionLetter::D), None);
    }

    #[test]
    fn question_deserializes_from_wire_shape() {
        let payload = r#"{
            "question_id": "q-17",
            "question": "Pick one.",
            "options": ["a", "b"],
            "difficulty": "medium",
            "topic_id": "t-3"
        }"#;
        let question: Question = serde_json::from_str(payload).unwrap();
        assert_eq!(question.prompt, "Pick one.");
        assert_eq!(question.options.len(), 2);
        assert_eq!(question.topic_id.as_ref().unwrap().as_str(), "t-3");
        assert!(question.correct_answer.is_none());
    }
}
