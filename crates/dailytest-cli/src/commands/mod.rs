pub mod init;
pub mod practice;
pub mod show;
pub mod take;
pub mod validate;

use std::time::Duration;

use anyhow::Result;

use dailytest_core::model::DateKey;
use dailytest_core::session::SessionConfig;
use dailytest_repository::DailyTestConfig;

/// The `--date` argument, or today.
fn date_key(date: Option<String>) -> Result<DateKey> {
    match date {
        Some(raw) => raw.parse().map_err(anyhow::Error::msg),
        None => Ok(DateKey::today()),
    }
}

fn session_config(config: &DailyTestConfig) -> SessionConfig {
    SessionConfig {
        close_grace: Duration::from_secs(config.close_grace_secs),
        low_time_secs: config.low_time_warning_secs,
        ..SessionConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_config_carries_low_time_threshold() {
        let config = DailyTestConfig {
            close_grace_secs: 0,
            low_time_warning_secs: 90,
            ..DailyTestConfig::default()
        };
        let session = session_config(&config);
        assert_eq!(session.close_grace, Duration::ZERO);
        assert_eq!(session.low_time_secs, 90);
    }
}
