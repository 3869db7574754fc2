//! Mock repository for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use dailytest_core::error::RepositoryError;
use dailytest_core::model::{DateKey, Test};
use dailytest_core::traits::TestRepository;

/// A repository backed by a fixed map, recording every lookup.
pub struct MockRepository {
    tests: HashMap<DateKey, Test>,
    /// When set, every lookup fails as unavailable with this message.
    outage: Option<String>,
    call_count: AtomicU32,
    last_request: Mutex<Option<DateKey>>,
}

impl MockRepository {
    pub fn new(tests: impl IntoIterator<Item = Test>) -> Self {
        Self {
            tests: tests.into_iter().map(|t| (t.date_key, t)).collect(),
            outage: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// A repository whose source is always down.
    pub fn unavailable(message: &str) -> Self {
        Self {
            outage: Some(message.to_string()),
            ..Self::empty()
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<DateKey> {
        self.last_request.lock().ok().and_then(|r| *r)
    }
}

#[async_trait]
impl TestRepository for MockRepository {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_test(&self, date_key: &DateKey) -> Result<Test, RepositoryError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(*date_key);
        }

        if let Some(message) = &self.outage {
            return Err(RepositoryError::SourceUnavailable(message.clone()));
        }
        self.tests
            .get(date_key)
            .cloned()
            .ok_or(RepositoryError::NotFound(*date_key))
    }
}
