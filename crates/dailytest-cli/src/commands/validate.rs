//! The `dailytest validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use dailytest_core::model::validate_test;
use dailytest_repository::read_table;

pub fn execute(tests_path: PathBuf) -> Result<()> {
    let mut tests = read_table(&tests_path)
        .with_context(|| format!("failed to load {}", tests_path.display()))?;

    if tests.is_empty() {
        println!("No tests found in {}.", tests_path.display());
        return Ok(());
    }

    tests.sort_by_key(|t| t.date_key);

    let mut total_warnings = 0;
    for test in &tests {
        println!(
            "Test {}: {} ({} questions)",
            test.date_key, test.kind, test.total_questions
        );

        let warnings = validate_test(test);
        for w in &warnings {
            let prefix = w
                .question_id
                .map(|id| format!("  [Q{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All tests valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
