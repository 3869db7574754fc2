//! Plain-text screens.

use comfy_table::{Cell, Table};

use dailytest_core::model::{Question, Test};
use dailytest_core::results::{TestResult, MARKS_PER_CORRECT, PENALTY_PER_WRONG};
use dailytest_core::session::{QuestionView, ReviewSummary};
use dailytest_core::timer::{format_clock, format_duration};

pub fn info(test: &Test) {
    println!("📝 {}", test.kind);
    println!("{}", test.date_key.long_form());
    println!();
    println!("  Questions:  {}", test.total_questions);
    println!("  Marks:      {}", test.total_marks);
    println!("  Duration:   {} minutes", test.duration_minutes());
    println!(
        "  Marking:    +{MARKS_PER_CORRECT} correct, -{PENALTY_PER_WRONG} wrong, 0 skipped"
    );
}

pub fn question(view: &QuestionView<'_>) {
    let clock = format_clock(view.remaining_seconds);
    let warning = if view.is_low_time() {
        "  ⚠ low time"
    } else {
        ""
    };
    println!();
    println!(
        "Question {}/{}  ⏱ {clock}{warning}  ({} answered)",
        view.number, view.total, view.answered
    );
    println!("[{} · {}]", view.question.subject, view.question.difficulty);
    println!("{}", view.question.text);
    for (i, line) in view.labelled_options().iter().enumerate() {
        let marker = if view.selected == Some(i) { "*" } else { " " };
        println!(" {marker} {line}");
    }
}

pub fn review(summary: &ReviewSummary) {
    println!();
    println!(
        "Answered: {}  Unanswered: {}",
        summary.answered, summary.unanswered
    );
    let tiles: Vec<String> = summary
        .items
        .iter()
        .map(|item| {
            let mark = if item.answered { "✓" } else { "·" };
            format!("{:>2}{mark}", item.index + 1)
        })
        .collect();
    for row in tiles.chunks(10) {
        println!("  {}", row.join(" "));
    }
    println!("Type `go N` to jump to a question or `back` to continue.");
}

pub fn result(result: &TestResult) {
    let tier = result.tier();
    println!();
    println!("{tier}");
    println!("{}", tier.message());

    let mut table = Table::new();
    table.set_header(vec!["Score", "Percentage", "Correct", "Wrong", "Skipped", "Time"]);
    table.add_row(vec![
        Cell::new(format!("{:.2} / {}", result.score, result.total_marks)),
        Cell::new(format!("{:.1}%", result.percentage())),
        Cell::new(result.correct),
        Cell::new(result.wrong),
        Cell::new(result.skipped),
        Cell::new(format_duration(result.elapsed_seconds)),
    ]);
    println!("{table}");
    println!("Type `explain` to request explanations or `quit` to close.");
}

pub fn help() {
    println!("Commands:");
    println!("  a, b, c, ...   select that option");
    println!("  next | prev    move between questions");
    println!("  skip           leave this one and move on");
    println!("  go N           jump to question N");
    println!("  review         show answered and unanswered questions");
    println!("  back           return from the review");
    println!("  submit         submit (asks to confirm)");
    println!("  explain        request explanations after submitting");
    println!("  quit           close without submitting");
}

/// The letter range a question accepts, e.g. `a-d`.
pub fn option_range(question: &Question) -> String {
    let last = question.options.len().saturating_sub(1);
    format!(
        "{}-{}",
        Question::option_label(0).to_ascii_lowercase(),
        Question::option_label(last).to_ascii_lowercase()
    )
}
