//! # Cache Invalidator
//!
//! Evicts the published key set from the edge cache so verifiers see a new key without waiting
//! for the cached copy to expire.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::Err;
use crate::provider::CacheInvalidation;
use crate::{tracerr, Result};

/// Request a single invalidation of `paths` on `distribution`.
///
/// The caller reference is derived from `at`, so each request is distinct from previous ones.
///
/// # Errors
///
/// * `Err::InvalidationFailed` - The edge cache refused the request.
pub async fn invalidate(
    cdn: &impl CacheInvalidation, distribution: &str, paths: &[String], at: DateTime<Utc>,
) -> Result<()> {
    let reference = at.to_rfc3339_opts(SecondsFormat::Millis, true);
    if let Err(e) = cdn.invalidate(distribution, &reference, paths).await {
        tracerr!(Err::InvalidationFailed, "unable to invalidate {}: {}", distribution, e);
    }
    tracing::info!(distribution, reference = %reference, ?paths, "invalidation requested");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::test_utils::RecordingInvalidator;

    #[tokio::test]
    async fn references_are_unique() {
        let cdn = RecordingInvalidator::new();
        let paths = vec!["/jwks.json".to_string()];
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).single().expect("valid date");

        invalidate(&cdn, "E2EXAMPLE", &paths, at).await.expect("should invalidate");
        invalidate(&cdn, "E2EXAMPLE", &paths, at + Duration::milliseconds(1))
            .await
            .expect("should invalidate");

        let requests = cdn.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].reference, "2026-10-19T08:00:00.000Z");
        assert_ne!(requests[0].reference, requests[1].reference);
        assert_eq!(requests[0].paths, paths);
    }

    #[tokio::test]
    async fn failure_has_code() {
        let cdn = RecordingInvalidator::new();
        cdn.fail(true);

        let err = invalidate(&cdn, "E2EXAMPLE", &["/jwks.json".to_string()], Utc::now())
            .await
            .expect_err("should fail");
        assert!(err.is(Err::InvalidationFailed));
    }
}
