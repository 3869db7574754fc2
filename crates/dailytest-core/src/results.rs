//! Scoring engine and the scored outcome of a session.
//!
//! Scoring is a pure function of the test, the frozen answers, and the
//! elapsed time. Correct answers earn 2 marks, wrong answers cost 0.667,
//! and the total never drops below zero.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{AnswerMap, DateKey, Test};

/// Marks added for a correct answer.
pub const MARKS_PER_CORRECT: f64 = 2.0;

/// Marks deducted for a wrong answer. Kept as the literal the results
/// channel has always reported, not 2/3.
pub const PENALTY_PER_WRONG: f64 = 0.667;

/// The scored outcome of a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Net score, never negative.
    pub score: f64,
    pub total_marks: f64,
    pub total_questions: usize,
    pub correct: usize,
    pub wrong: usize,
    pub skipped: usize,
    pub elapsed_seconds: u64,
    pub date_key: DateKey,
    /// Answers as they stood at submission.
    pub answers: AnswerMap,
}

impl TestResult {
    pub fn percentage(&self) -> f64 {
        percentage(self.score, self.total_marks)
    }

    pub fn tier(&self) -> FeedbackTier {
        FeedbackTier::for_percentage(self.percentage())
    }
}

/// Score a set of answers against a test.
pub fn score(test: &Test, answers: &AnswerMap, elapsed_seconds: u64) -> TestResult {
    let mut correct = 0usize;
    let mut wrong = 0usize;
    let mut skipped = 0usize;
    let mut raw = 0.0f64;

    for q in &test.questions {
        match answers.get(q.id) {
            None => skipped += 1,
            Some(selected) if selected == q.correct_option => {
                correct += 1;
                raw += MARKS_PER_CORRECT;
            }
            Some(_) => {
                wrong += 1;
                raw -= PENALTY_PER_WRONG;
            }
        }
    }

    TestResult {
        score: raw.max(0.0),
        total_marks: test.total_marks,
        total_questions: test.questions.len(),
        correct,
        wrong,
        skipped,
        elapsed_seconds,
        date_key: test.date_key,
        answers: answers.clone(),
    }
}

/// `score / total_marks * 100`, rounded to one decimal place.
pub fn percentage(score: f64, total_marks: f64) -> f64 {
    if total_marks <= 0.0 {
        return 0.0;
    }
    (score / total_marks * 1000.0).round() / 10.0
}

/// Feedback band selected by percentage. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackTier {
    Outstanding,
    Excellent,
    VeryGood,
    Good,
    KeepTrying,
    NeedsPractice,
}

impl FeedbackTier {
    pub fn for_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            FeedbackTier::Outstanding
        } else if percentage >= 80.0 {
            FeedbackTier::Excellent
        } else if percentage >= 70.0 {
            FeedbackTier::VeryGood
        } else if percentage >= 60.0 {
            FeedbackTier::Good
        } else if percentage >= 40.0 {
            FeedbackTier::KeepTrying
        } else {
            FeedbackTier::NeedsPractice
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            FeedbackTier::Outstanding => "🏆",
            FeedbackTier::Excellent => "🌟",
            FeedbackTier::VeryGood => "👏",
            FeedbackTier::Good => "👍",
            FeedbackTier::KeepTrying => "💪",
            FeedbackTier::NeedsPractice => "📚",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FeedbackTier::Outstanding => "Outstanding Performance!",
            FeedbackTier::Excellent => "Excellent Work!",
            FeedbackTier::VeryGood => "Very Good!",
            FeedbackTier::Good => "Good Job!",
            FeedbackTier::KeepTrying => "Keep Trying!",
            FeedbackTier::NeedsPractice => "Need More Practice",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            FeedbackTier::Outstanding => "You are a star! Keep shining! ⭐",
            FeedbackTier::Excellent => "Great job! You are doing amazing!",
            FeedbackTier::VeryGood => "Well done! Keep up the good work!",
            FeedbackTier::Good => "Nice effort! A bit more practice will help!",
            FeedbackTier::KeepTrying => "Don't give up! Practice makes perfect!",
            FeedbackTier::NeedsPractice => "Focus on your studies. You can do better!",
        }
    }
}

impl fmt::Display for FeedbackTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.emoji(), self.title())
    }
}
