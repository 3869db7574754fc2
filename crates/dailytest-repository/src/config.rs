//! Source configuration and repository factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use dailytest_core::traits::TestRepository;

use crate::layered::LayeredRepository;
use crate::remote::{RemoteRepository, DEFAULT_LANGUAGE, DEFAULT_QUESTION_COUNT, DEFAULT_TIMEOUT_SECS};
use crate::static_table::StaticRepository;

/// Overrides the question bank URL, turning a static source into a
/// layered one.
pub const API_URL_ENV: &str = "DAILYTEST_API_URL";

/// Where tests come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    /// A TOML table on disk, or the bundled sample when no file is given.
    Static {
        #[serde(default)]
        tests_file: Option<PathBuf>,
    },
    /// The remote question bank.
    Remote {
        base_url: String,
        #[serde(default = "default_count")]
        count: u32,
        #[serde(default = "default_language")]
        language: String,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    /// The static table first, the question bank for dates it lacks.
    Layered {
        #[serde(default)]
        tests_file: Option<PathBuf>,
        base_url: String,
        #[serde(default = "default_count")]
        count: u32,
        #[serde(default = "default_language")]
        language: String,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Static { tests_file: None }
    }
}

fn default_count() -> u32 {
    DEFAULT_QUESTION_COUNT
}
fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Top-level dailytest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTestConfig {
    #[serde(default)]
    pub source: SourceConfig,
    /// How long the "no test today" notice stays up before closing.
    #[serde(default = "default_close_grace")]
    pub close_grace_secs: u64,
    /// Remaining time below which the countdown is flagged.
    #[serde(default = "default_low_time")]
    pub low_time_warning_secs: u32,
}

fn default_close_grace() -> u64 {
    3
}
fn default_low_time() -> u32 {
    dailytest_core::timer::LOW_TIME_SECS
}

impl Default for DailyTestConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            close_grace_secs: default_close_grace(),
            low_time_warning_secs: default_low_time(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

/// Resolve env vars and anchor a relative tests file at `base_dir`.
fn resolve_tests_file(path: &Option<PathBuf>, base_dir: Option<&Path>) -> Option<PathBuf> {
    path.as_ref().map(|p| {
        let resolved = PathBuf::from(resolve_env_vars(&p.to_string_lossy()));
        match base_dir {
            Some(dir) if resolved.is_relative() => dir.join(resolved),
            _ => resolved,
        }
    })
}

fn resolve_source_config(source: &SourceConfig, base_dir: Option<&Path>) -> SourceConfig {
    match source {
        SourceConfig::Static { tests_file } => SourceConfig::Static {
            tests_file: resolve_tests_file(tests_file, base_dir),
        },
        SourceConfig::Remote {
            base_url,
            count,
            language,
            timeout_secs,
        } => SourceConfig::Remote {
            base_url: resolve_env_vars(base_url),
            count: *count,
            language: language.clone(),
            timeout_secs: *timeout_secs,
        },
        SourceConfig::Layered {
            tests_file,
            base_url,
            count,
            language,
            timeout_secs,
        } => SourceConfig::Layered {
            tests_file: resolve_tests_file(tests_file, base_dir),
            base_url: resolve_env_vars(base_url),
            count: *count,
            language: language.clone(),
            timeout_secs: *timeout_secs,
        },
    }
}

/// Point the source at `url`. A static source keeps its table and gains the
/// bank as a fallback.
pub fn apply_api_url(source: SourceConfig, url: String) -> SourceConfig {
    match source {
        SourceConfig::Static { tests_file } => SourceConfig::Layered {
            tests_file,
            base_url: url,
            count: default_count(),
            language: default_language(),
            timeout_secs: default_timeout(),
        },
        SourceConfig::Remote {
            count,
            language,
            timeout_secs,
            ..
        } => SourceConfig::Remote {
            base_url: url,
            count,
            language,
            timeout_secs,
        },
        SourceConfig::Layered {
            tests_file,
            count,
            language,
            timeout_secs,
            ..
        } => SourceConfig::Layered {
            tests_file,
            base_url: url,
            count,
            language,
            timeout_secs,
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `dailytest.toml` in the current directory
/// 2. `~/.config/dailytest/config.toml`
///
/// `DAILYTEST_API_URL` overrides the question bank URL.
pub fn load_config() -> Result<DailyTestConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<DailyTestConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("dailytest.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let (mut config, base_dir) = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<DailyTestConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            (config, path.parent().map(Path::to_path_buf))
        }
        None => (DailyTestConfig::default(), None),
    };

    if let Ok(url) = std::env::var(API_URL_ENV) {
        if !url.is_empty() {
            config.source = apply_api_url(config.source, url);
        }
    }

    config.source = resolve_source_config(&config.source, base_dir.as_deref());
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("dailytest"))
}

fn static_repository(tests_file: &Option<PathBuf>) -> Result<StaticRepository> {
    let repo = match tests_file {
        Some(path) => StaticRepository::from_file(path)
            .with_context(|| format!("failed to load tests from {}", path.display()))?,
        None => StaticRepository::sample().context("failed to load the bundled sample tests")?,
    };
    Ok(repo)
}

/// Create a repository from its configuration.
pub fn create_repository(config: &SourceConfig) -> Result<Box<dyn TestRepository>> {
    match config {
        SourceConfig::Static { tests_file } => Ok(Box::new(static_repository(tests_file)?)),
        SourceConfig::Remote { .. } => Ok(Box::new(create_remote(config)?)),
        SourceConfig::Layered { tests_file, .. } => Ok(Box::new(LayeredRepository::new(
            Box::new(static_repository(tests_file)?),
            Box::new(create_remote(config)?),
        ))),
    }
}

/// The question bank client for a remote or layered source.
pub fn create_remote(config: &SourceConfig) -> Result<RemoteRepository> {
    match config {
        SourceConfig::Remote {
            base_url,
            count,
            language,
            timeout_secs,
        }
        | SourceConfig::Layered {
            base_url,
            count,
            language,
            timeout_secs,
            ..
        } => {
            if base_url.is_empty() {
                anyhow::bail!("question bank base_url is empty");
            }
            Ok(RemoteRepository::with_options(
                base_url,
                *count,
                language,
                *timeout_secs,
            )?)
        }
        SourceConfig::Static { .. } => {
            anyhow::bail!("source is static; configure a remote source or set {API_URL_ENV}")
        }
    }
}
