//! A primary repository with a fallback.

use async_trait::async_trait;

use dailytest_core::error::RepositoryError;
use dailytest_core::model::{DateKey, Test};
use dailytest_core::traits::TestRepository;

/// Consults `fallback` only when `primary` has no test for the key. Any
/// other primary failure is returned as is.
pub struct LayeredRepository {
    primary: Box<dyn TestRepository>,
    fallback: Box<dyn TestRepository>,
}

impl LayeredRepository {
    pub fn new(primary: Box<dyn TestRepository>, fallback: Box<dyn TestRepository>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl TestRepository for LayeredRepository {
    fn name(&self) -> &str {
        "layered"
    }

    async fn get_test(&self, date_key: &DateKey) -> Result<Test, RepositoryError> {
        match self.primary.get_test(date_key).await {
            Err(RepositoryError::NotFound(_)) => {
                tracing::debug!(
                    date = %date_key,
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    "primary has no test, trying fallback"
                );
                self.fallback.get_test(date_key).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::mock::MockRepository;
    use crate::static_table::StaticRepository;

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn primary_hit_skips_fallback() {
        let fallback = Arc::new(MockRepository::empty());
        let repo = LayeredRepository::new(
            Box::new(StaticRepository::sample().unwrap()),
            Box::new(fallback.clone()),
        );

        let test = repo.get_test(&key("2025-10-31")).await.unwrap();
        assert_eq!(test.total_questions, 20);
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn miss_falls_through() {
        let fallback = Arc::new(MockRepository::empty());
        let repo = LayeredRepository::new(
            Box::new(StaticRepository::sample().unwrap()),
            Box::new(fallback.clone()),
        );

        let err = repo.get_test(&key("2025-11-01")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
        assert_eq!(fallback.call_count(), 1);
        assert_eq!(fallback.last_request(), Some(key("2025-11-01")));
    }

    #[tokio::test]
    async fn primary_outage_is_not_masked() {
        let fallback = Arc::new(MockRepository::empty());
        let repo = LayeredRepository::new(
            Box::new(MockRepository::unavailable("connection refused")),
            Box::new(fallback.clone()),
        );

        let err = repo.get_test(&key("2025-10-31")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::SourceUnavailable(_)));
        assert_eq!(fallback.call_count(), 0);
    }
}
