//! Question-bank HTTP adapter.
//!
//! The bank serves multilingual questions with lettered answers. Everything
//! it returns is normalized into the same [`Test`] shape the static table
//! produces, so the session machine never sees the wire format.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use dailytest_core::error::RepositoryError;
use dailytest_core::model::{DateKey, Difficulty, Question, Test};
use dailytest_core::traits::TestRepository;

pub const DEFAULT_QUESTION_COUNT: u32 = 10;
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const TEST_KIND: &str = "UPSC Prelims";
const DEFAULT_SUBJECT: &str = "General Studies";
const SECONDS_PER_QUESTION: f64 = 1.5 * 60.0;

/// A test as served by the question bank.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTestPayload {
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub questions: Vec<RawQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestion {
    #[serde(default)]
    pub question_id: Option<serde_json::Value>,
    /// Text variants keyed by language code.
    #[serde(default)]
    pub language: HashMap<String, RawLanguageVariant>,
    /// Option letter, `A` through `D`.
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLanguageVariant {
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<Option<String>>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Optional narrowing for a practice test.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeFilters {
    pub count: u32,
    pub subject: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub year: Option<u16>,
}

impl Default for PracticeFilters {
    fn default() -> Self {
        Self {
            count: DEFAULT_QUESTION_COUNT,
            subject: None,
            difficulty: None,
            year: None,
        }
    }
}

/// Map an answer letter to a zero-based option index. Anything outside
/// `A`..`D` maps to 0.
pub fn answer_index(letter: &str) -> usize {
    match letter.trim().to_ascii_uppercase().as_str() {
        "A" => 0,
        "B" => 1,
        "C" => 2,
        "D" => 3,
        other => {
            tracing::warn!(letter = other, "unrecognized answer letter, using A");
            0
        }
    }
}

/// Time allowed for `n` questions: ninety seconds each, rounded up.
pub fn duration_for(question_count: usize) -> u32 {
    (question_count as f64 * SECONDS_PER_QUESTION).ceil() as u32
}

/// Convert a bank payload into a [`Test`].
///
/// Questions without the requested language (or English as a fallback), or
/// with fewer than two non-empty options, are dropped. Ids are renumbered
/// 1..n over the questions that survive.
pub fn normalize_payload(
    raw: RawTestPayload,
    date_key: DateKey,
    language: &str,
    kind: &str,
) -> Test {
    let mut questions = Vec::with_capacity(raw.questions.len());

    for (position, q) in raw.questions.into_iter().enumerate() {
        let source_id = q.question_id.as_ref().map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        });

        let variant = q
            .language
            .get(language)
            .or_else(|| q.language.get(DEFAULT_LANGUAGE));
        let Some(variant) = variant else {
            tracing::warn!(position, language, "question has no usable language variant, dropping");
            continue;
        };

        let options: Vec<String> = variant
            .options
            .iter()
            .flatten()
            .filter(|o| !o.is_empty())
            .cloned()
            .collect();
        if options.len() < 2 {
            tracing::warn!(position, options = options.len(), "question has too few options, dropping");
            continue;
        }

        let mut correct_option = answer_index(&q.correct_answer);
        if correct_option >= options.len() {
            tracing::warn!(position, correct_option, "answer letter beyond options, using A");
            correct_option = 0;
        }

        let difficulty = q
            .difficulty
            .as_deref()
            .and_then(|d| d.parse().ok())
            .unwrap_or_default();

        questions.push(Question {
            id: questions.len() as u32 + 1,
            text: variant.question_text.clone(),
            options,
            correct_option,
            subject: q
                .subject
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            difficulty,
            explanation: variant.explanation.clone().unwrap_or_default(),
            source_id,
            year: q.year.or(raw.year),
        });
    }

    let duration = duration_for(questions.len());
    Test::from_questions(date_key, kind, questions, duration)
}

/// Fetches daily and practice tests from the question bank.
#[derive(Debug)]
pub struct RemoteRepository {
    base_url: String,
    count: u32,
    language: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl RemoteRepository {
    pub fn new(base_url: &str) -> Result<Self, RepositoryError> {
        Self::with_options(base_url, DEFAULT_QUESTION_COUNT, DEFAULT_LANGUAGE, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_options(
        base_url: &str,
        count: u32,
        language: &str,
        timeout_secs: u64,
    ) -> Result<Self, RepositoryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RepositoryError::SourceUnavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            count,
            language: language.to_string(),
            timeout_secs,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A practice test drawn from the bank, keyed to today.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn practice_test(&self, filters: &PracticeFilters) -> Result<Test, RepositoryError> {
        let date_key = DateKey::today();
        let query = vec![
            ("count", filters.count.to_string()),
            ("subject", filters.subject.clone().unwrap_or_default()),
            (
                "difficulty",
                filters.difficulty.map(|d| d.to_string()).unwrap_or_default(),
            ),
            (
                "year",
                filters.year.map(|y| y.to_string()).unwrap_or_default(),
            ),
        ];
        let raw = self.fetch("upsc/practice-test", &query, date_key).await?;
        self.finish(raw, date_key)
    }

    async fn fetch(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        date_key: DateKey,
    ) -> Result<RawTestPayload, RepositoryError> {
        let url = format!("{}/{endpoint}", self.base_url);
        tracing::debug!(%url, "requesting test");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RepositoryError::SourceUnavailable(format!(
                        "request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    RepositoryError::SourceUnavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RepositoryError::NotFound(date_key));
        }
        if !status.is_success() {
            let status = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RepositoryError::SourceUnavailable(format!(
                "HTTP {status}: {body}"
            )));
        }

        response.json::<RawTestPayload>().await.map_err(|e| {
            RepositoryError::SourceUnavailable(format!("failed to parse response: {e}"))
        })
    }

    fn finish(&self, raw: RawTestPayload, date_key: DateKey) -> Result<Test, RepositoryError> {
        let test = normalize_payload(raw, date_key, &self.language, TEST_KIND);
        if test.questions.is_empty() {
            tracing::warn!(date = %date_key, "question bank returned no usable questions");
            return Err(RepositoryError::NotFound(date_key));
        }
        tracing::info!(
            date = %date_key,
            questions = test.total_questions,
            "loaded test from question bank"
        );
        Ok(test)
    }
}

#[async_trait]
impl TestRepository for RemoteRepository {
    fn name(&self) -> &str {
        "remote"
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn get_test(&self, date_key: &DateKey) -> Result<Test, RepositoryError> {
        let query = vec![
            ("date", date_key.to_string()),
            ("count", self.count.to_string()),
        ];
        let raw = self.fetch("upsc/daily-test", &query, *date_key).await?;
        self.finish(raw, *date_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn key() -> DateKey {
        "2025-10-31".parse().unwrap()
    }

    fn bank_question(id: &str, answer: &str, options: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "question_id": id,
            "language": {
                "en": {
                    "question_text": format!("Question {id}"),
                    "options": options,
                    "explanation": "because"
                }
            },
            "correct_answer": answer,
            "subject": "Polity",
            "difficulty": "hard"
        })
    }

    fn payload(questions: Vec<serde_json::Value>) -> RawTestPayload {
        serde_json::from_value(serde_json::json!({"year": 2023, "questions": questions})).unwrap()
    }

    #[test]
    fn letters_map_to_indices() {
        assert_eq!(answer_index("A"), 0);
        assert_eq!(answer_index("c"), 2);
        assert_eq!(answer_index(" D "), 3);
        assert_eq!(answer_index("E"), 0);
        assert_eq!(answer_index(""), 0);
    }

    #[test]
    fn duration_is_ninety_seconds_per_question() {
        assert_eq!(duration_for(10), 900);
        assert_eq!(duration_for(1), 90);
        assert_eq!(duration_for(0), 0);
    }

    #[test]
    fn normalize_fills_defaults() {
        let raw: RawTestPayload = serde_json::from_value(serde_json::json!({
            "year": 2022,
            "questions": [{
                "question_id": 77,
                "language": {"en": {"question_text": "Q", "options": ["x", "y", "z"]}},
                "correct_answer": "B"
            }]
        }))
        .unwrap();

        let test = normalize_payload(raw, key(), "en", "UPSC Prelims");
        let q = &test.questions[0];
        assert_eq!(q.id, 1);
        assert_eq!(q.subject, "General Studies");
        assert_eq!(q.difficulty, Difficulty::Medium);
        assert_eq!(q.explanation, "");
        assert_eq!(q.correct_option, 1);
        assert_eq!(q.year, Some(2022));
        assert_eq!(q.source_id.as_deref(), Some("77"));
        assert_eq!(test.total_marks, 2.0);
        assert_eq!(test.duration_seconds, 90);
    }

    #[test]
    fn normalize_drops_unusable_questions() {
        let raw = payload(vec![
            bank_question("q1", "A", serde_json::json!(["a", "b", "c", "d"])),
            bank_question("q2", "A", serde_json::json!(["only", "", null])),
            serde_json::json!({"question_id": "q3", "language": {"hi": {"question_text": "?", "options": ["a", "b"]}}, "correct_answer": "A"}),
            bank_question("q4", "D", serde_json::json!(["a", "b"])),
        ]);

        let test = normalize_payload(raw, key(), "en", "UPSC Prelims");
        assert_eq!(test.total_questions, 2);
        assert_eq!(test.questions[0].source_id.as_deref(), Some("q1"));
        assert_eq!(test.questions[1].id, 2);
        // D with only two options falls back to the first
        assert_eq!(test.questions[1].correct_option, 0);
    }

    #[test]
    fn normalize_prefers_requested_language() {
        let raw: RawTestPayload = serde_json::from_value(serde_json::json!({
            "questions": [{
                "language": {
                    "en": {"question_text": "English", "options": ["a", "b"]},
                    "hi": {"question_text": "Hindi", "options": ["क", "ख"]}
                },
                "correct_answer": "B"
            }]
        }))
        .unwrap();

        let test = normalize_payload(raw.clone(), key(), "hi", "UPSC Prelims");
        assert_eq!(test.questions[0].text, "Hindi");

        let test = normalize_payload(raw, key(), "ta", "UPSC Prelims");
        assert_eq!(test.questions[0].text, "English");
    }

    #[tokio::test]
    async fn daily_test_success() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "year": 2024,
            "questions": [
                bank_question("1", "C", serde_json::json!(["w", "x", "y", "z"])),
                bank_question("2", "A", serde_json::json!(["w", "x", "y", "z"]))
            ]
        });

        Mock::given(method("GET"))
            .and(path("/upsc/daily-test"))
            .and(query_param("date", "2025-10-31"))
            .and(query_param("count", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let repo = RemoteRepository::new(&server.uri()).unwrap();
        let test = repo.get_test(&key()).await.unwrap();
        assert_eq!(test.date_key, key());
        assert_eq!(test.kind, "UPSC Prelims");
        assert_eq!(test.total_questions, 2);
        assert_eq!(test.duration_seconds, 180);
        assert_eq!(test.questions[0].correct_option, 2);
        assert_eq!(test.questions[0].difficulty, Difficulty::Hard);
        assert_eq!(test.questions[0].year, Some(2024));
    }

    #[tokio::test]
    async fn not_found_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/upsc/daily-test"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let repo = RemoteRepository::new(&server.uri()).unwrap();
        let err = repo.get_test(&key()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(k) if k == key()));
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/upsc/daily-test"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let repo = RemoteRepository::new(&server.uri()).unwrap();
        let err = repo.get_test(&key()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::SourceUnavailable(_)));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn non_success_status_is_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/upsc/daily-test"))
            .respond_with(ResponseTemplate::new(304))
            .mount(&server)
            .await;

        let repo = RemoteRepository::new(&server.uri()).unwrap();
        let err = repo.get_test(&key()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::SourceUnavailable(_)));
        assert!(err.to_string().contains("HTTP 304"));
    }

    #[tokio::test]
    async fn unparseable_body_is_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/upsc/daily-test"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let repo = RemoteRepository::new(&server.uri()).unwrap();
        let err = repo.get_test(&key()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn empty_payload_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/upsc/daily-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"questions": []})))
            .mount(&server)
            .await;

        let repo = RemoteRepository::new(&server.uri()).unwrap();
        let err = repo.get_test(&key()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_unavailable() {
        let repo = RemoteRepository::with_options("http://127.0.0.1:1", 10, "en", 2).unwrap();
        let err = repo.get_test(&key()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn practice_test_sends_filters() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "questions": [bank_question("9", "B", serde_json::json!(["a", "b", "c"]))]
        });

        Mock::given(method("GET"))
            .and(path("/upsc/practice-test"))
            .and(query_param("count", "5"))
            .and(query_param("subject", "Polity"))
            .and(query_param("difficulty", "hard"))
            .and(query_param("year", "2021"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let repo = RemoteRepository::new(&format!("{}/", server.uri())).unwrap();
        let filters = PracticeFilters {
            count: 5,
            subject: Some("Polity".into()),
            difficulty: Some(Difficulty::Hard),
            year: Some(2021),
        };
        let test = repo.practice_test(&filters).await.unwrap();
        assert_eq!(test.total_questions, 1);
        assert_eq!(test.questions[0].correct_option, 1);
    }
}
