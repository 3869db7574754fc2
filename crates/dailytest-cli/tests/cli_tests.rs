//! CLI integration tests using assert_cmd.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn dailytest() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("dailytest").unwrap();
    cmd.env_remove("DAILYTEST_API_URL");
    cmd
}

/// A config using the bundled sample table and no close delay.
fn sample_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("dailytest.toml");
    std::fs::write(
        &path,
        "close_grace_secs = 0\n\n[source]\ntype = \"static\"\n",
    )
    .unwrap();
    path
}

#[test]
fn help_output() {
    dailytest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Timed multiple-choice daily tests"));
}

#[test]
fn version_output() {
    dailytest()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dailytest"));
}

#[test]
fn show_sample_test() {
    let dir = TempDir::new().unwrap();
    let config = sample_config(&dir);

    dailytest()
        .args(["show", "--date", "2025-10-31", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("31 October 2025"))
        .stdout(predicate::str::contains("Questions:  20"))
        .stdout(predicate::str::contains("Duration:   60 minutes"));
}

#[test]
fn show_missing_date() {
    let dir = TempDir::new().unwrap();
    let config = sample_config(&dir);

    dailytest()
        .args(["show", "--date", "2025-11-01", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("No test available for today"));
}

#[test]
fn invalid_date_is_an_error() {
    dailytest()
        .args(["show", "--date", "31/10/2025"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn embedded_attempt_reports_to_host() {
    let dir = TempDir::new().unwrap();
    let config = sample_config(&dir);

    let output = dailytest()
        .args(["take", "--date", "2025-10-31", "--embedded", "--config"])
        .arg(&config)
        .write_stdin("start\nb\nsubmit\nyes\nexplain\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("You have answered 1/20 questions."))
        .stdout(predicate::str::contains("Need More Practice"))
        .stdout(predicate::str::contains("CLOSE"))
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    let sent: Vec<serde_json::Value> = stdout
        .lines()
        .filter_map(|l| l.strip_prefix("SEND "))
        .map(|json| serde_json::from_str(json).unwrap())
        .collect();

    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["action"], "submit_test");
    assert_eq!(sent[0]["results"]["date"], "2025-10-31");
    assert_eq!(sent[0]["results"]["score"], 2.0);
    assert_eq!(sent[0]["results"]["total_marks"], 40.0);
    assert_eq!(sent[0]["results"]["correct"], 1);
    assert_eq!(sent[0]["results"]["wrong"], 0);
    assert_eq!(sent[0]["results"]["skipped"], 19);
    assert_eq!(sent[1]["action"], "view_explanations");
}

#[test]
fn quitting_discards_the_attempt() {
    let dir = TempDir::new().unwrap();
    let config = sample_config(&dir);

    dailytest()
        .args(["take", "--date", "2025-10-31", "--config"])
        .arg(&config)
        .write_stdin("start\na\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Question 1/20"))
        .stdout(predicate::str::contains("Goodbye."))
        .stdout(predicate::str::contains("SEND").not());
}

#[test]
fn end_of_input_closes_the_session() {
    let dir = TempDir::new().unwrap();
    let config = sample_config(&dir);

    dailytest()
        .args(["take", "--date", "2025-10-31", "--config"])
        .arg(&config)
        .write_stdin("start\nnext\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Question 2/20"))
        .stdout(predicate::str::contains("Goodbye."));
}

#[test]
fn missing_test_closes_after_notice() {
    let dir = TempDir::new().unwrap();
    let config = sample_config(&dir);

    dailytest()
        .args(["take", "--date", "2030-01-01", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("No test available for today"))
        .stdout(predicate::str::contains("Goodbye."));
}

#[test]
fn practice_needs_a_question_bank() {
    let dir = TempDir::new().unwrap();
    let config = sample_config(&dir);

    dailytest()
        .args(["practice", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("static"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    dailytest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created dailytest.toml"))
        .stdout(predicate::str::contains("Created tests/daily.toml"));

    assert!(dir.path().join("dailytest.toml").exists());
    assert!(dir.path().join("tests/daily.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    dailytest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    dailytest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn validate_generated_table() {
    let dir = TempDir::new().unwrap();

    dailytest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    dailytest()
        .current_dir(dir.path())
        .args(["validate", "--tests", "tests/daily.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Test 2025-10-31: Daily Test (20 questions)"))
        .stdout(predicate::str::contains("All tests valid."));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[[tests]]
date = "2026-02-01"

[[tests.questions]]
id = 1
question = "Pick one"
options = ["only"]
answer = 3
"#,
    )
    .unwrap();

    dailytest()
        .arg("validate")
        .arg("--tests")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[Q1] WARNING"))
        .stdout(predicate::str::contains("warning(s) found"));
}

#[test]
fn unplayable_table_is_refused() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("tests.toml"),
        r#"
[[tests]]
date = "2026-02-01"

[[tests.questions]]
id = 1
question = "Pick one"
options = ["yes", "no"]
answer = 0

[[tests.questions]]
id = 1
question = "Pick again"
options = ["yes", "no"]
answer = 0
"#,
    )
    .unwrap();
    let config = dir.path().join("dailytest.toml");
    std::fs::write(
        &config,
        "close_grace_secs = 0\n\n[source]\ntype = \"static\"\ntests_file = \"tests.toml\"\n",
    )
    .unwrap();

    dailytest()
        .args(["show", "--date", "2026-02-01", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate question id"));
}

#[test]
fn validate_nonexistent_file() {
    dailytest()
        .args(["validate", "--tests", "nonexistent.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn config_tests_file_is_relative_to_config() {
    let dir = TempDir::new().unwrap();

    dailytest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    // run from elsewhere; the table path still resolves next to the config
    dailytest()
        .args(["show", "--date", "2025-10-31", "--config"])
        .arg(dir.path().join("dailytest.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Daily Test"));
}
