//! Result reporting to the host bot.
//!
//! Outbound messages are JSON objects tagged by `action`. Reporting never
//! fails from the caller's point of view: a missing bridge or an encoding
//! failure is logged and the session carries on.

use serde::{Deserialize, Serialize};

use crate::host::Host;
use crate::model::DateKey;
use crate::results::TestResult;

/// A message sent to the bot through `send_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OutboundMessage {
    SubmitTest { results: SubmissionPayload },
    ViewExplanations { date: DateKey },
}

/// The subset of a result the bot stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub date: DateKey,
    pub score: f64,
    pub total_marks: f64,
    pub correct: usize,
    pub wrong: usize,
    pub skipped: usize,
    pub time_taken: u64,
}

impl From<&TestResult> for SubmissionPayload {
    fn from(result: &TestResult) -> Self {
        Self {
            date: result.date_key,
            score: result.score,
            total_marks: result.total_marks,
            correct: result.correct,
            wrong: result.wrong,
            skipped: result.skipped,
            time_taken: result.elapsed_seconds,
        }
    }
}

impl OutboundMessage {
    pub fn submit(result: &TestResult) -> Self {
        OutboundMessage::SubmitTest {
            results: SubmissionPayload::from(result),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Sends messages to the host, degrading to a no-op without a bridge.
pub struct ResultReporter;

impl ResultReporter {
    /// Report a submitted result. Returns whether it reached the bridge.
    pub fn report(host: &Host, result: &TestResult) -> bool {
        Self::send(host, &OutboundMessage::submit(result))
    }

    pub fn send(host: &Host, message: &OutboundMessage) -> bool {
        match message.to_json() {
            Ok(json) => {
                tracing::debug!(payload = %json, "sending to host");
                host.send_data(&json)
            }
            Err(e) => {
                tracing::warn!("failed to encode outbound message: {e}");
                false
            }
        }
    }
}
