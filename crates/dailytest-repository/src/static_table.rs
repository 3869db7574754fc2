//! Tests held in a TOML table keyed by date.
//!
//! ```toml
//! [[tests]]
//! date = "2025-10-31"
//! kind = "Daily Test"
//! duration_minutes = 60
//!
//! [[tests.questions]]
//! question = "What is the capital of India?"
//! options = ["Mumbai", "New Delhi", "Kolkata", "Chennai"]
//! answer = 1
//! subject = "General Knowledge"
//! difficulty = "easy"
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use dailytest_core::error::RepositoryError;
use dailytest_core::model::{validate_test, DateKey, Difficulty, Question, Test};
use dailytest_core::traits::TestRepository;

/// The bundled sample table, also written out by `dailytest init`.
pub const SAMPLE_TABLE: &str = include_str!("../data/sample-tests.toml");

#[derive(Debug, Deserialize)]
struct TomlTable {
    #[serde(default)]
    tests: Vec<TomlTest>,
}

#[derive(Debug, Deserialize)]
struct TomlTest {
    date: DateKey,
    #[serde(default = "default_kind")]
    kind: String,
    #[serde(default = "default_duration_minutes")]
    duration_minutes: u32,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    /// Defaults to the 1-based position in the table.
    #[serde(default)]
    id: Option<u32>,
    question: String,
    options: Vec<String>,
    answer: usize,
    #[serde(default = "default_subject")]
    subject: String,
    #[serde(default)]
    difficulty: Difficulty,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    year: Option<u16>,
}

fn default_kind() -> String {
    "Daily Test".to_string()
}
fn default_duration_minutes() -> u32 {
    60
}
fn default_subject() -> String {
    "General Studies".to_string()
}

impl TomlTest {
    fn into_test(self) -> Test {
        let questions = self
            .questions
            .into_iter()
            .enumerate()
            .map(|(i, q)| Question {
                id: q.id.unwrap_or(i as u32 + 1),
                text: q.question,
                options: q.options,
                correct_option: q.answer,
                subject: q.subject,
                difficulty: q.difficulty,
                explanation: q.explanation,
                source_id: None,
                year: q.year,
            })
            .collect();
        Test::from_questions(
            self.date,
            self.kind,
            questions,
            self.duration_minutes.saturating_mul(60),
        )
    }
}

/// Parse a TOML table into tests, in file order, without checking them.
pub fn parse_table(content: &str) -> Result<Vec<Test>, RepositoryError> {
    let table: TomlTable = toml::from_str(content)
        .map_err(|e| RepositoryError::InvalidData(format!("failed to parse test table: {e}")))?;
    Ok(table.tests.into_iter().map(TomlTest::into_test).collect())
}

/// Read and parse a table file without checking its tests.
pub fn read_table(path: &Path) -> Result<Vec<Test>, RepositoryError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        RepositoryError::InvalidData(format!("failed to read {}: {e}", path.display()))
    })?;
    parse_table(&content)
}

/// Questions must have distinct non-zero ids, at least two options, and an
/// answer that names one of them.
fn check_playable(test: &Test) -> Result<(), RepositoryError> {
    let mut seen = HashSet::new();
    for q in &test.questions {
        let problem = if q.id == 0 {
            Some("id must be positive".to_string())
        } else if !seen.insert(q.id) {
            Some("duplicate question id".to_string())
        } else if q.options.len() < 2 {
            Some(format!("needs at least 2 options, has {}", q.options.len()))
        } else if q.correct_option >= q.options.len() {
            Some(format!(
                "answer {} is out of range for {} options",
                q.correct_option,
                q.options.len()
            ))
        } else {
            None
        };
        if let Some(problem) = problem {
            return Err(RepositoryError::InvalidData(format!(
                "test {} question {}: {problem}",
                test.date_key, q.id
            )));
        }
    }
    Ok(())
}

/// An in-memory table of tests, one per date key.
#[derive(Debug, Clone, Default)]
pub struct StaticRepository {
    tests: HashMap<DateKey, Test>,
}

impl StaticRepository {
    pub fn new(tests: impl IntoIterator<Item = Test>) -> Self {
        Self {
            tests: tests.into_iter().map(|t| (t.date_key, t)).collect(),
        }
    }

    /// Parse a TOML table. A question that cannot be answered or scored
    /// rejects the whole table; other problems are logged. A later entry for
    /// the same date replaces an earlier one.
    pub fn from_toml_str(content: &str) -> Result<Self, RepositoryError> {
        let mut tests = HashMap::new();
        for test in parse_table(content)? {
            check_playable(&test)?;
            for warning in validate_test(&test) {
                tracing::warn!(
                    date = %test.date_key,
                    question = ?warning.question_id,
                    "{}",
                    warning.message
                );
            }
            if tests.insert(test.date_key, test).is_some() {
                tracing::warn!("duplicate test entry in table, keeping the last one");
            }
        }
        Ok(Self { tests })
    }

    pub fn from_file(path: &Path) -> Result<Self, RepositoryError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RepositoryError::InvalidData(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// The bundled table with the 31 October 2025 daily test.
    pub fn sample() -> Result<Self, RepositoryError> {
        Self::from_toml_str(SAMPLE_TABLE)
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Date keys in ascending order.
    pub fn dates(&self) -> Vec<DateKey> {
        let mut dates: Vec<DateKey> = self.tests.keys().copied().collect();
        dates.sort();
        dates
    }

    pub fn tests(&self) -> impl Iterator<Item = &Test> {
        self.tests.values()
    }
}

#[async_trait]
impl TestRepository for StaticRepository {
    fn name(&self) -> &str {
        "static"
    }

    async fn get_test(&self, date_key: &DateKey) -> Result<Test, RepositoryError> {
        self.tests
            .get(date_key)
            .cloned()
            .ok_or(RepositoryError::NotFound(*date_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    #[test]
    fn sample_table_has_the_october_test() {
        let repo = StaticRepository::sample().unwrap();
        assert_eq!(repo.dates(), vec![key("2025-10-31")]);

        let test = repo.tests().next().unwrap();
        assert_eq!(test.total_questions, 20);
        assert_eq!(test.total_marks, 40.0);
        assert_eq!(test.duration_seconds, 3600);
        assert_eq!(test.kind, "Daily Test");
        assert!(validate_test(test).is_empty());

        let first = &test.questions[0];
        assert_eq!(first.options[first.correct_option], "New Delhi");
        assert_eq!(test.questions[17].difficulty, Difficulty::Hard);
    }

    #[test]
    fn parse_defaults() {
        let repo = StaticRepository::from_toml_str(
            r#"
[[tests]]
date = "2026-01-05"

[[tests.questions]]
question = "2 + 2?"
options = ["3", "4"]
answer = 1

[[tests.questions]]
question = "3 + 3?"
options = ["6", "7"]
answer = 0
"#,
        )
        .unwrap();

        let test = repo.tests().next().unwrap();
        assert_eq!(test.kind, "Daily Test");
        assert_eq!(test.duration_seconds, 3600);
        assert_eq!(test.questions[1].id, 2);
        assert_eq!(test.questions[0].subject, "General Studies");
        assert_eq!(test.questions[0].difficulty, Difficulty::Medium);
    }

    #[test]
    fn malformed_table_is_invalid_data() {
        let err = StaticRepository::from_toml_str("[[tests]]\ndate = \"not-a-date\"").unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidData(_)));
    }

    fn one_test(questions: &str) -> String {
        format!("[[tests]]\ndate = \"2026-01-05\"\n{questions}")
    }

    fn rejection(questions: &str) -> String {
        match StaticRepository::from_toml_str(&one_test(questions)) {
            Err(RepositoryError::InvalidData(msg)) => msg,
            other => panic!("expected InvalidData, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let msg = rejection(
            r#"
[[tests.questions]]
id = 1
question = "First"
options = ["a", "b"]
answer = 0

[[tests.questions]]
id = 1
question = "Second"
options = ["a", "b"]
answer = 0
"#,
        );
        assert!(msg.contains("duplicate question id"), "{msg}");
    }

    #[test]
    fn zero_id_is_rejected() {
        let msg = rejection(
            r#"
[[tests.questions]]
id = 0
question = "Zero"
options = ["a", "b"]
answer = 0
"#,
        );
        assert!(msg.contains("id must be positive"), "{msg}");
    }

    #[test]
    fn single_option_is_rejected() {
        let msg = rejection(
            r#"
[[tests.questions]]
question = "Only one"
options = ["a"]
answer = 0
"#,
        );
        assert!(msg.contains("at least 2 options"), "{msg}");
    }

    #[test]
    fn answer_past_options_is_rejected() {
        let msg = rejection(
            r#"
[[tests.questions]]
question = "Out of range"
options = ["a", "b", "c", "d"]
answer = 4
"#,
        );
        assert!(msg.contains("out of range"), "{msg}");
    }

    #[test]
    fn unchecked_parse_keeps_broken_tests() {
        let tests = parse_table(&one_test(
            r#"
[[tests.questions]]
question = "Only one"
options = ["a"]
answer = 3
"#,
        ))
        .unwrap();
        assert_eq!(tests.len(), 1);
        assert!(!validate_test(&tests[0]).is_empty());
    }

    #[test]
    fn missing_file_is_invalid_data() {
        let err = StaticRepository::from_file(Path::new("/nonexistent/tests.toml")).unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidData(_)));
    }

    #[tokio::test]
    async fn lookup_by_date() {
        let repo = StaticRepository::sample().unwrap();

        let test = repo.get_test(&key("2025-10-31")).await.unwrap();
        assert_eq!(test.questions.len(), 20);

        let err = repo.get_test(&key("2025-11-01")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(k) if k == key("2025-11-01")));
    }
}
