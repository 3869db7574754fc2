//! The `dailytest practice` command.

use std::path::PathBuf;

use anyhow::Result;

use dailytest_core::model::Difficulty;
use dailytest_core::session::SessionMachine;
use dailytest_core::timer::TokioTickSource;
use dailytest_repository::{create_remote, load_config_from, PracticeFilters};

use crate::{console, interactive};

pub async fn execute(
    count: u32,
    subject: Option<String>,
    difficulty: Option<String>,
    year: Option<u16>,
    config_path: Option<PathBuf>,
    embedded: bool,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let difficulty = difficulty
        .map(|d| d.parse::<Difficulty>())
        .transpose()
        .map_err(anyhow::Error::msg)?;
    let filters = PracticeFilters {
        count,
        subject,
        difficulty,
        year,
    };
    let remote = create_remote(&config.source)?;

    let (source, ticks) = TokioTickSource::channel();
    let mut machine = SessionMachine::new(console::host(embedded), Box::new(source))
        .with_config(super::session_config(&config));
    machine.host().init();

    match remote.practice_test(&filters).await {
        Ok(test) => machine.load_test(test)?,
        Err(e) => {
            tracing::error!(session = %machine.id(), "{e}");
            machine.mark_unavailable(e.to_string())?
        }
    };

    interactive::present(&mut machine, ticks).await;
    Ok(())
}
