//! Seams the session machine depends on: where tests come from and what
//! time it is.
//!
//! `TestRepository` is implemented by the `dailytest-repository` crate.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::RepositoryError;
use crate::model::{DateKey, Test};

/// Supplies the test for a date key.
#[async_trait]
pub trait TestRepository: Send + Sync {
    /// Human-readable source name (e.g. "static").
    fn name(&self) -> &str;

    /// Fetch the test for `date_key`.
    async fn get_test(&self, date_key: &DateKey) -> Result<Test, RepositoryError>;
}

#[async_trait]
impl<T: TestRepository + ?Sized> TestRepository for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn get_test(&self, date_key: &DateKey) -> Result<Test, RepositoryError> {
        (**self).get_test(date_key).await
    }
}

/// Wall clock used for start and submit timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|n| *n).unwrap_or_else(|_| Utc::now())
    }
}
