//! The `dailytest show` command.

use std::path::PathBuf;

use anyhow::Result;

use dailytest_core::session::UNAVAILABLE_MESSAGE;
use dailytest_repository::{create_repository, load_config_from};

use crate::render;

pub async fn execute(date: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let date_key = super::date_key(date)?;
    let repo = create_repository(&config.source)?;

    match repo.get_test(&date_key).await {
        Ok(test) => render::info(&test),
        Err(e) if e.is_no_test() => {
            tracing::info!(source = repo.name(), "{e}");
            println!("{UNAVAILABLE_MESSAGE}");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
