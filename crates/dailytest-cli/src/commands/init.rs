//! The `dailytest init` command.

use std::path::Path;

use anyhow::Result;

use dailytest_repository::SAMPLE_TABLE;

pub fn execute() -> Result<()> {
    if Path::new("dailytest.toml").exists() {
        println!("dailytest.toml already exists, skipping.");
    } else {
        std::fs::write("dailytest.toml", SAMPLE_CONFIG)?;
        println!("Created dailytest.toml");
    }

    std::fs::create_dir_all("tests")?;
    let table_path = Path::new("tests/daily.toml");
    if table_path.exists() {
        println!("tests/daily.toml already exists, skipping.");
    } else {
        std::fs::write(table_path, SAMPLE_TABLE)?;
        println!("Created tests/daily.toml");
    }

    println!("\nNext steps:");
    println!("  1. Add tests to tests/daily.toml, or point [source] at a question bank");
    println!("  2. Run: dailytest validate --tests tests/daily.toml");
    println!("  3. Run: dailytest take --date 2025-10-31");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# dailytest configuration

# Seconds the "no test today" notice stays up before closing.
close_grace_secs = 3
low_time_warning_secs = 300

[source]
type = "static"
tests_file = "tests/daily.toml"

# Serve dates missing from the table from the question bank instead:
#
# [source]
# type = "layered"
# tests_file = "tests/daily.toml"
# base_url = "${DAILYTEST_API_URL}"
# count = 10
# language = "en"
"#;
