//! Test-session state machine.
//!
//! Screens follow `Loading → Info → InProgress ⇄ Reviewing → Submitting →
//! Completed`, with `Loading → Unavailable` when no test can be found. Every
//! operation is checked against [`target_screen`] before it touches any
//! state, and a call from the wrong screen is rejected with
//! [`SessionError::InvalidTransition`].
//!
//! The countdown and user input both enter through `&mut self`, so a tick
//! can never interleave with a submit. The timer is cancelled before any
//! transition out of the live screens, which makes late ticks no-ops.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::host::Host;
use crate::model::{AnswerMap, DateKey, Question, Test};
use crate::report::{OutboundMessage, ResultReporter};
use crate::results::{self, TestResult};
use crate::timer::{self, TickSource, Ticker, TimerId};
use crate::traits::{Clock, SystemClock, TestRepository};

/// Alert shown when the countdown reaches zero.
pub const TIME_UP_MESSAGE: &str = "⏰ Time is up! Submitting your test...";

/// Shown on the unavailable screen.
pub const UNAVAILABLE_MESSAGE: &str = "No test available for today";

// ---------------------------------------------------------------------------
// Screen and Trigger
// ---------------------------------------------------------------------------

/// The screen the machine is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    /// Waiting for the repository.
    Loading,
    /// Test metadata shown before the user commits.
    Info,
    /// Live answering.
    InProgress,
    /// Read-only answered/unanswered summary of the live session.
    Reviewing,
    /// Scoring and reporting in progress.
    Submitting,
    /// Result shown; terminal for this session.
    Completed,
    /// No test could be loaded; terminal.
    Unavailable,
}

impl Screen {
    /// Whether the countdown is running on this screen.
    pub fn is_live(&self) -> bool {
        matches!(self, Screen::InProgress | Screen::Reviewing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Screen::Completed | Screen::Unavailable)
    }

    /// Stable string tag for structured logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Loading => "loading",
            Screen::Info => "info",
            Screen::InProgress => "in_progress",
            Screen::Reviewing => "reviewing",
            Screen::Submitting => "submitting",
            Screen::Completed => "completed",
            Screen::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named operations checked against the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Test loaded (`Loading → Info`).
    Load,
    /// Repository had no test (`Loading → Unavailable`).
    LoadFailed,
    /// User starts the test (`Info → InProgress`).
    Start,
    /// One second elapsed.
    Tick,
    SelectAnswer,
    /// Jump to a question by index (also leaves `Reviewing`).
    GoTo,
    /// Next / previous / skip.
    Step,
    /// Open the review summary (`InProgress → Reviewing`).
    Review,
    /// Leave the review summary (`Reviewing → InProgress`).
    BackToTest,
    RequestSubmit,
    CancelSubmit,
    /// User confirmed submission (`InProgress → Submitting`).
    ConfirmSubmit,
    /// Countdown reached zero (`InProgress | Reviewing → Submitting`).
    Expire,
    /// Scoring and reporting finished (`Submitting → Completed`).
    Finish,
    ViewExplanations,
}

impl Trigger {
    /// Stable string tag for structured logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Load => "load",
            Trigger::LoadFailed => "load_failed",
            Trigger::Start => "start",
            Trigger::Tick => "tick",
            Trigger::SelectAnswer => "select_answer",
            Trigger::GoTo => "go_to",
            Trigger::Step => "step",
            Trigger::Review => "review",
            Trigger::BackToTest => "back_to_test",
            Trigger::RequestSubmit => "request_submit",
            Trigger::CancelSubmit => "cancel_submit",
            Trigger::ConfirmSubmit => "confirm_submit",
            Trigger::Expire => "expire",
            Trigger::Finish => "finish",
            Trigger::ViewExplanations => "view_explanations",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target screen for a trigger, or `None` if the trigger is invalid there.
pub fn target_screen(current: Screen, trigger: Trigger) -> Option<Screen> {
    use Screen as S;
    use Trigger as T;
    match (current, trigger) {
        (S::Loading, T::Load) => Some(S::Info),
        (S::Loading, T::LoadFailed) => Some(S::Unavailable),
        (S::Info, T::Start) => Some(S::InProgress),

        (S::InProgress, T::Tick) => Some(S::InProgress),
        (S::Reviewing, T::Tick) => Some(S::Reviewing),

        (S::InProgress, T::SelectAnswer)
        | (S::InProgress, T::Step)
        | (S::InProgress, T::GoTo)
        | (S::InProgress, T::RequestSubmit)
        | (S::InProgress, T::CancelSubmit) => Some(S::InProgress),

        (S::InProgress, T::Review) => Some(S::Reviewing),
        (S::Reviewing, T::BackToTest) | (S::Reviewing, T::GoTo) => Some(S::InProgress),

        (S::InProgress, T::ConfirmSubmit)
        | (S::InProgress, T::Expire)
        | (S::Reviewing, T::Expire) => Some(S::Submitting),

        (S::Submitting, T::Finish) => Some(S::Completed),
        (S::Completed, T::ViewExplanations) => Some(S::Completed),

        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Session and views
// ---------------------------------------------------------------------------

/// Run-time state of one attempt. Created by `start`, discarded on submit.
#[derive(Debug, Clone)]
pub struct Session {
    pub test: Arc<Test>,
    pub current_index: usize,
    pub answers: AnswerMap,
    pub remaining_seconds: u32,
    pub started_at: DateTime<Utc>,
}

impl Session {
    fn new(test: Arc<Test>, started_at: DateTime<Utc>) -> Self {
        let remaining_seconds = test.duration_seconds;
        Self {
            test,
            current_index: 0,
            answers: AnswerMap::new(),
            remaining_seconds,
            started_at,
        }
    }

    fn current_question(&self) -> Option<&Question> {
        self.test.question(self.current_index)
    }
}

/// What the question screen shows.
#[derive(Debug, Clone)]
pub struct QuestionView<'a> {
    /// 1-based position.
    pub number: usize,
    pub total: usize,
    pub question: &'a Question,
    pub selected: Option<usize>,
    pub answered: usize,
    pub remaining_seconds: u32,
    /// Remaining time below which the countdown is flagged.
    pub low_time_secs: u32,
}

impl QuestionView<'_> {
    pub fn is_first(&self) -> bool {
        self.number == 1
    }

    pub fn is_last(&self) -> bool {
        self.number == self.total
    }

    pub fn is_low_time(&self) -> bool {
        self.remaining_seconds < self.low_time_secs
    }

    /// Options prefixed with their letter, e.g. `B. New Delhi`.
    pub fn labelled_options(&self) -> Vec<String> {
        self.question
            .options
            .iter()
            .enumerate()
            .map(|(i, opt)| format!("{}. {opt}", Question::option_label(i)))
            .collect()
    }
}

/// One tile of the review summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem {
    pub index: usize,
    pub question_id: u32,
    pub answered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSummary {
    pub answered: usize,
    pub unanswered: usize,
    pub items: Vec<ReviewItem>,
}

/// Counts shown when the user asks to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitConfirmation {
    pub answered: usize,
    pub total: usize,
}

impl SubmitConfirmation {
    pub fn message(&self) -> String {
        format!(
            "You have answered {}/{} questions.",
            self.answered, self.total
        )
    }
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not live, or the tick belonged to a cancelled timer.
    Ignored,
    /// Countdown continues with this many seconds left.
    Remaining(u32),
    /// Countdown hit zero and the session was submitted.
    Expired,
}

// ---------------------------------------------------------------------------
// SessionMachine
// ---------------------------------------------------------------------------

/// Timing knobs for the machine.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Countdown granularity.
    pub tick_period: Duration,
    /// How long the unavailable screen stays up before closing.
    pub close_grace: Duration,
    /// Remaining seconds below which the question view reports low time.
    pub low_time_secs: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
            close_grace: Duration::from_secs(3),
            low_time_secs: timer::LOW_TIME_SECS,
        }
    }
}

/// Single owner of the test, the live session, and the countdown.
pub struct SessionMachine {
    id: Uuid,
    screen: Screen,
    host: Host,
    clock: Arc<dyn Clock>,
    ticker: Ticker,
    config: SessionConfig,
    test: Option<Arc<Test>>,
    session: Option<Session>,
    confirmation: Option<SubmitConfirmation>,
    result: Option<TestResult>,
    unavailable_reason: Option<String>,
    closed: bool,
}

impl SessionMachine {
    pub fn new(host: Host, tick_source: Box<dyn TickSource>) -> Self {
        Self::with_clock(host, tick_source, Arc::new(SystemClock))
    }

    pub fn with_clock(host: Host, tick_source: Box<dyn TickSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            id: Uuid::new_v4(),
            screen: Screen::Loading,
            host,
            clock,
            ticker: Ticker::new(tick_source),
            config: SessionConfig::default(),
            test: None,
            session: None,
            confirmation: None,
            result: None,
            unavailable_reason: None,
            closed: false,
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn test(&self) -> Option<&Test> {
        self.test.as_deref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    pub fn confirmation(&self) -> Option<SubmitConfirmation> {
        self.confirmation
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        self.unavailable_reason.as_deref()
    }

    pub fn remaining_seconds(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.remaining_seconds)
    }

    pub fn timer_running(&self) -> bool {
        self.ticker.is_running()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn guard(&self, trigger: Trigger) -> Result<Screen, SessionError> {
        target_screen(self.screen, trigger).ok_or_else(|| {
            let err = SessionError::InvalidTransition {
                current: self.screen,
                attempted: trigger,
            };
            tracing::warn!(
                session = %self.id,
                code = err.error_code(),
                "rejected {trigger} from {}",
                self.screen
            );
            err
        })
    }

    fn enter(&mut self, target: Screen, trigger: Trigger) {
        if target != self.screen {
            tracing::debug!(
                session = %self.id,
                from = %self.screen,
                to = %target,
                trigger = %trigger,
                "transition"
            );
        }
        self.screen = target;
    }

    fn live_session(&mut self) -> Result<&mut Session, SessionError> {
        self.session.as_mut().ok_or(SessionError::NoTestLoaded)
    }

    // -- Loading ------------------------------------------------------------

    /// Run the host handshake and fetch the test for `date_key`.
    ///
    /// Any repository failure lands on `Unavailable`; the returned screen
    /// says which way it went.
    pub async fn load(
        &mut self,
        repo: &dyn TestRepository,
        date_key: &DateKey,
    ) -> Result<Screen, SessionError> {
        self.guard(Trigger::Load)?;
        self.host.init();

        match repo.get_test(date_key).await {
            Ok(test) => {
                tracing::info!(
                    session = %self.id,
                    source = repo.name(),
                    date = %test.date_key,
                    questions = test.total_questions,
                    "test loaded"
                );
                self.load_test(test)
            }
            Err(e) => {
                tracing::error!(session = %self.id, source = repo.name(), "{e}");
                self.mark_unavailable(e.to_string())
            }
        }
    }

    /// Install an already-fetched test (`Loading → Info`).
    pub fn load_test(&mut self, test: Test) -> Result<Screen, SessionError> {
        let target = self.guard(Trigger::Load)?;
        self.test = Some(Arc::new(test));
        self.enter(target, Trigger::Load);
        Ok(self.screen)
    }

    /// Give up loading (`Loading → Unavailable`).
    pub fn mark_unavailable(&mut self, reason: impl Into<String>) -> Result<Screen, SessionError> {
        let target = self.guard(Trigger::LoadFailed)?;
        self.unavailable_reason = Some(reason.into());
        self.enter(target, Trigger::LoadFailed);
        Ok(self.screen)
    }

    /// Keep the unavailable screen up for the grace period, then close.
    pub async fn close_after_grace(&mut self) -> Result<(), SessionError> {
        if self.screen != Screen::Unavailable {
            return Err(SessionError::InvalidTransition {
                current: self.screen,
                attempted: Trigger::LoadFailed,
            });
        }
        tokio::time::sleep(self.config.close_grace).await;
        self.close();
        Ok(())
    }

    // -- Live session -------------------------------------------------------

    /// Begin the attempt and start the countdown.
    pub fn start(&mut self) -> Result<TimerId, SessionError> {
        let Some(test) = self.test.clone() else {
            tracing::warn!(session = %self.id, "start without a loaded test");
            return Err(SessionError::NoTestLoaded);
        };
        let target = self.guard(Trigger::Start)?;

        self.session = Some(Session::new(test, self.clock.now()));
        self.confirmation = None;
        self.enter(target, Trigger::Start);
        let timer = self.ticker.start(self.config.tick_period);
        tracing::info!(session = %self.id, timer = timer.as_u64(), "test started");
        Ok(timer)
    }

    /// Deliver a tick from a tick source. Ticks from a cancelled timer are
    /// ignored.
    pub fn on_timer(&mut self, id: TimerId) -> TickOutcome {
        if self.ticker.active() != Some(id) {
            tracing::trace!(session = %self.id, timer = id.as_u64(), "stale tick");
            return TickOutcome::Ignored;
        }
        self.tick()
    }

    /// One second elapsed. Submits automatically, exactly once, at zero.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.ticker.is_running() || target_screen(self.screen, Trigger::Tick).is_none() {
            return TickOutcome::Ignored;
        }
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Ignored;
        };

        session.remaining_seconds = session.remaining_seconds.saturating_sub(1);
        let remaining = session.remaining_seconds;
        if remaining > 0 {
            return TickOutcome::Remaining(remaining);
        }

        self.auto_submit();
        TickOutcome::Expired
    }

    fn auto_submit(&mut self) {
        tracing::info!(session = %self.id, "time is up, auto submitting");
        // Cancel before alerting so nothing the host does can tick again.
        self.ticker.cancel();
        self.host.alert(TIME_UP_MESSAGE);
        if let Err(e) = self.submit(Trigger::Expire) {
            tracing::error!(session = %self.id, code = e.error_code(), "auto submit failed: {e}");
        }
    }

    /// Answer the current question, replacing any earlier answer.
    pub fn select_answer(&mut self, option: usize) -> Result<(), SessionError> {
        let target = self.guard(Trigger::SelectAnswer)?;
        let session = self.live_session()?;
        let question = session
            .current_question()
            .ok_or(SessionError::NoTestLoaded)?;
        let available = question.options.len();
        if option >= available {
            return Err(SessionError::OptionOutOfRange {
                index: option,
                available,
            });
        }
        let question_id = question.id;
        session.answers.select(question_id, option);
        self.confirmation = None;
        self.enter(target, Trigger::SelectAnswer);
        Ok(())
    }

    /// Jump to a question by zero-based index. From `Reviewing` this also
    /// returns to the question screen.
    pub fn go_to(&mut self, index: usize) -> Result<(), SessionError> {
        let target = self.guard(Trigger::GoTo)?;
        let session = self.live_session()?;
        let total = session.test.total_questions;
        if index >= total {
            return Err(SessionError::QuestionOutOfRange { index, total });
        }
        session.current_index = index;
        self.confirmation = None;
        self.enter(target, Trigger::GoTo);
        Ok(())
    }

    /// Move forward one question. Returns `false` on the last question.
    pub fn next(&mut self) -> Result<bool, SessionError> {
        self.step(1)
    }

    /// Move back one question. Returns `false` on the first question.
    pub fn previous(&mut self) -> Result<bool, SessionError> {
        self.step(-1)
    }

    /// Leave the current question unanswered and move on.
    pub fn skip(&mut self) -> Result<bool, SessionError> {
        self.next()
    }

    fn step(&mut self, delta: isize) -> Result<bool, SessionError> {
        self.guard(Trigger::Step)?;
        let session = self.live_session()?;
        let total = session.test.total_questions;
        match session.current_index.checked_add_signed(delta) {
            Some(index) if index < total => {
                session.current_index = index;
                self.confirmation = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Open the answered/unanswered summary.
    pub fn show_review(&mut self) -> Result<ReviewSummary, SessionError> {
        let target = self.guard(Trigger::Review)?;
        let summary = self.review_summary().ok_or(SessionError::NoTestLoaded)?;
        self.confirmation = None;
        self.enter(target, Trigger::Review);
        Ok(summary)
    }

    pub fn back_to_test(&mut self) -> Result<(), SessionError> {
        let target = self.guard(Trigger::BackToTest)?;
        self.enter(target, Trigger::BackToTest);
        Ok(())
    }

    /// Summary of the live session, available on any live screen.
    pub fn review_summary(&self) -> Option<ReviewSummary> {
        let session = self.session.as_ref()?;
        let items: Vec<ReviewItem> = session
            .test
            .questions
            .iter()
            .enumerate()
            .map(|(index, q)| ReviewItem {
                index,
                question_id: q.id,
                answered: session.answers.is_answered(q.id),
            })
            .collect();
        let answered = items.iter().filter(|i| i.answered).count();
        Some(ReviewSummary {
            answered,
            unanswered: items.len() - answered,
            items,
        })
    }

    /// Ask to submit. Opens the confirmation step without changing the
    /// session.
    pub fn request_submit(&mut self) -> Result<SubmitConfirmation, SessionError> {
        self.guard(Trigger::RequestSubmit)?;
        let session = self.session.as_ref().ok_or(SessionError::NoTestLoaded)?;
        let confirmation = SubmitConfirmation {
            answered: session.answers.answered_count(),
            total: session.test.total_questions,
        };
        self.confirmation = Some(confirmation);
        Ok(confirmation)
    }

    /// Dismiss the confirmation step.
    pub fn cancel_submit(&mut self) -> Result<(), SessionError> {
        self.guard(Trigger::CancelSubmit)?;
        self.confirmation = None;
        Ok(())
    }

    /// Submit after the user confirmed. Requires an open confirmation step.
    pub fn confirm_submit(&mut self) -> Result<&TestResult, SessionError> {
        self.guard(Trigger::ConfirmSubmit)?;
        if self.confirmation.is_none() {
            return Err(SessionError::InvalidTransition {
                current: self.screen,
                attempted: Trigger::ConfirmSubmit,
            });
        }
        self.submit(Trigger::ConfirmSubmit)
    }

    fn submit(&mut self, trigger: Trigger) -> Result<&TestResult, SessionError> {
        let target = self.guard(trigger)?;
        self.ticker.cancel();
        self.confirmation = None;
        let session = self.session.take().ok_or(SessionError::NoTestLoaded)?;
        self.enter(target, trigger);

        let elapsed = (self.clock.now() - session.started_at).num_seconds().max(0) as u64;
        let result = results::score(&session.test, &session.answers, elapsed);
        tracing::info!(
            session = %self.id,
            score = result.score,
            correct = result.correct,
            wrong = result.wrong,
            skipped = result.skipped,
            elapsed,
            "test submitted"
        );
        ResultReporter::report(&self.host, &result);

        let done = self.guard(Trigger::Finish)?;
        self.enter(done, Trigger::Finish);
        let stored = self.result.insert(result);
        Ok(&*stored)
    }

    // -- Completed ----------------------------------------------------------

    /// Ask the bot to send explanations for this test.
    pub fn view_explanations(&mut self) -> Result<bool, SessionError> {
        self.guard(Trigger::ViewExplanations)?;
        let date = self
            .result
            .as_ref()
            .map(|r| r.date_key)
            .ok_or(SessionError::NoTestLoaded)?;
        Ok(ResultReporter::send(
            &self.host,
            &OutboundMessage::ViewExplanations { date },
        ))
    }

    // -- Views --------------------------------------------------------------

    pub fn current_question(&self) -> Option<QuestionView<'_>> {
        let session = self.session.as_ref()?;
        let question = session.current_question()?;
        Some(QuestionView {
            number: session.current_index + 1,
            total: session.test.total_questions,
            question,
            selected: session.answers.get(question.id),
            answered: session.answers.answered_count(),
            remaining_seconds: session.remaining_seconds,
            low_time_secs: self.config.low_time_secs,
        })
    }

    // -- Teardown -----------------------------------------------------------

    /// Leave the app: stop the countdown, discard any live session, and
    /// close the host surface. Safe to call more than once.
    pub fn close(&mut self) {
        if self.ticker.cancel() {
            tracing::debug!(session = %self.id, "timer cleared on close");
        }
        if self.session.take().is_some() {
            tracing::info!(session = %self.id, "live session discarded");
        }
        self.confirmation = None;
        if !self.closed {
            self.closed = true;
            self.host.close();
        }
    }
}
