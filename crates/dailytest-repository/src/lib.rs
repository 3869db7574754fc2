//! dailytest-repository: where daily tests come from.
//!
//! Implements the `TestRepository` trait over a static TOML table, the remote
//! question bank, and a layered combination of the two.

pub mod config;
pub mod layered;
pub mod mock;
pub mod remote;
pub mod static_table;

pub use config::{
    create_remote, create_repository, load_config, load_config_from, DailyTestConfig,
    SourceConfig,
};
pub use dailytest_core::error::RepositoryError;
pub use layered::LayeredRepository;
pub use remote::{PracticeFilters, RemoteRepository};
pub use static_table::{parse_table, read_table, StaticRepository, SAMPLE_TABLE};
