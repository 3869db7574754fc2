//! Error types shared across the dailytest crates.
//!
//! `RepositoryError` is defined here rather than in `dailytest-repository`
//! so the session machine can classify load failures without string
//! matching.

use thiserror::Error;

use crate::model::DateKey;
use crate::session::{Screen, Trigger};

/// Errors returned by a test repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No test exists for the requested key.
    #[error("no test found for {0}")]
    NotFound(DateKey),

    /// The source could not be reached, returned a non-success status, or
    /// sent a body that could not be parsed.
    #[error("test source unavailable: {0}")]
    SourceUnavailable(String),

    /// Local test data could not be read or is malformed.
    #[error("invalid test data: {0}")]
    InvalidData(String),
}

impl RepositoryError {
    /// Both variants mean "no test today" to the session machine.
    pub fn is_no_test(&self) -> bool {
        matches!(
            self,
            RepositoryError::NotFound(_) | RepositoryError::SourceUnavailable(_)
        )
    }
}

/// Errors from session state machine operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// `start` was called before a test was loaded.
    #[error("no test loaded")]
    NoTestLoaded,

    /// The operation is not valid from the current screen.
    #[error("invalid transition: {attempted} from {current}")]
    InvalidTransition { current: Screen, attempted: Trigger },

    /// An option index beyond the current question's options.
    #[error("option {index} out of range (question has {available} options)")]
    OptionOutOfRange { index: usize, available: usize },

    /// A question index beyond the test.
    #[error("question {index} out of range (test has {total} questions)")]
    QuestionOutOfRange { index: usize, total: usize },
}

impl SessionError {
    /// Stable error code for structured logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::NoTestLoaded => "SESSION_NO_TEST_LOADED",
            SessionError::InvalidTransition { .. } => "SESSION_INVALID_TRANSITION",
            SessionError::OptionOutOfRange { .. } => "SESSION_OPTION_OUT_OF_RANGE",
            SessionError::QuestionOutOfRange { .. } => "SESSION_QUESTION_OUT_OF_RANGE",
        }
    }
}
