//! Core data model types for dailytest.
//!
//! A [`Test`] is one timed quiz for a date key; an [`AnswerMap`] holds the
//! user's selections while a session is live.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Marks awarded for each question answered correctly.
pub const MARKS_PER_QUESTION: f64 = 2.0;

/// A `YYYY-MM-DD` calendar date identifying a daily test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Today's key, taken from the UTC calendar date.
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Long form used on the info screen, e.g. `31 October 2025`.
    pub fn long_form(&self) -> String {
        self.0.format("%-d %B %Y").to_string()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|e| format!("invalid date key '{s}' (expected YYYY-MM-DD): {e}"))
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Question difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// 1-based display id, unique within a test.
    pub id: u32,
    /// The question text.
    pub text: String,
    /// Answer options in display order.
    pub options: Vec<String>,
    /// Zero-based index into `options`.
    pub correct_option: usize,
    pub subject: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub explanation: String,
    /// Identifier in the upstream question bank, if any.
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
}

impl Question {
    /// Letter label for an option index (`0 -> 'A'`).
    pub fn option_label(index: usize) -> char {
        u8::try_from(index)
            .ok()
            .and_then(|i| b'A'.checked_add(i))
            .map(char::from)
            .unwrap_or('?')
    }
}

/// One timed quiz for a given date key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub date_key: DateKey,
    /// Free-form label such as "Daily Test" or "UPSC Prelims".
    #[serde(default)]
    pub kind: String,
    pub total_questions: usize,
    pub total_marks: f64,
    pub duration_seconds: u32,
    pub questions: Vec<Question>,
}

impl Test {
    /// Build a test, deriving the question count and total marks.
    pub fn from_questions(
        date_key: DateKey,
        kind: impl Into<String>,
        questions: Vec<Question>,
        duration_seconds: u32,
    ) -> Self {
        Self {
            date_key,
            kind: kind.into(),
            total_questions: questions.len(),
            total_marks: questions.len() as f64 * MARKS_PER_QUESTION,
            duration_seconds,
            questions,
        }
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Whole minutes shown on the info screen.
    pub fn duration_minutes(&self) -> u32 {
        self.duration_seconds.div_ceil(60)
    }
}

/// The user's selections keyed by question id. A missing key means the
/// question is unanswered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<u32, usize>);

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a selection, replacing any earlier one for the same question.
    pub fn select(&mut self, question_id: u32, option: usize) -> Option<usize> {
        self.0.insert(question_id, option)
    }

    pub fn get(&self, question_id: u32) -> Option<usize> {
        self.0.get(&question_id).copied()
    }

    pub fn is_answered(&self, question_id: u32) -> bool {
        self.0.contains_key(&question_id)
    }

    pub fn answered_count(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

impl FromIterator<(u32, usize)> for AnswerMap {
    fn from_iter<I: IntoIterator<Item = (u32, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A problem found while validating a test.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question id (if applicable).
    pub question_id: Option<u32>,
    /// Warning message.
    pub message: String,
}

/// Check a test for structural problems.
pub fn validate_test(test: &Test) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if test.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "test has no questions".into(),
        });
    }

    if test.total_questions != test.questions.len() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: format!(
                "total_questions is {} but {} questions are listed",
                test.total_questions,
                test.questions.len()
            ),
        });
    }

    let expected_marks = test.questions.len() as f64 * MARKS_PER_QUESTION;
    if (test.total_marks - expected_marks).abs() > f64::EPSILON {
        warnings.push(ValidationWarning {
            question_id: None,
            message: format!(
                "total_marks is {} but questions are worth {expected_marks}",
                test.total_marks
            ),
        });
    }

    if test.duration_seconds == 0 {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "duration is zero".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for q in &test.questions {
        if q.id == 0 {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: "question id must be positive".into(),
            });
        }
        if !seen_ids.insert(q.id) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: format!("duplicate question id: {}", q.id),
            });
        }
        if q.text.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: "question text is empty".into(),
            });
        }
        if q.options.len() < 2 {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: format!("needs at least 2 options, found {}", q.options.len()),
            });
        }
        if q.correct_option >= q.options.len() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: format!(
                    "correct option {} is out of range for {} options",
                    q.correct_option,
                    q.options.len()
                ),
            });
        }
    }

    warnings
}
