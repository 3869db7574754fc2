//! The `dailytest take` command.

use std::path::PathBuf;

use anyhow::Result;

use dailytest_core::session::SessionMachine;
use dailytest_core::timer::TokioTickSource;
use dailytest_repository::{create_repository, load_config_from};

use crate::{console, interactive};

pub async fn execute(date: Option<String>, config_path: Option<PathBuf>, embedded: bool) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let date_key = super::date_key(date)?;
    let repo = create_repository(&config.source)?;

    let (source, ticks) = TokioTickSource::channel();
    let mut machine = SessionMachine::new(console::host(embedded), Box::new(source))
        .with_config(super::session_config(&config));
    tracing::debug!(session = %machine.id(), date = %date_key, source = repo.name(), "loading");

    machine.load(repo.as_ref(), &date_key).await?;
    interactive::present(&mut machine, ticks).await;
    Ok(())
}
