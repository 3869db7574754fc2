//! dailytest-core: Test model, scoring engine, and session state machine.
//!
//! This crate defines the data model, the test-session state machine, and
//! the scoring logic that the rest of dailytest builds on. Nothing here
//! touches the network or the terminal; the host bridge, the tick source,
//! and the test repository are injected.

pub mod error;
pub mod host;
pub mod model;
pub mod report;
pub mod results;
pub mod session;
pub mod timer;
pub mod traits;
