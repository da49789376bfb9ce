use aws_config::SdkConfig;
use aws_sdk_cloudfront::error::DisplayErrorContext;
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};
use aws_sdk_cloudfront::Client;
use jwks_rotate::error::Err;
use jwks_rotate::{tracerr, CacheInvalidation, Result};

/// Amazon CloudFront cache invalidation.
#[derive(Clone, Debug)]
pub struct CloudFront {
    client: Client,
}

impl CloudFront {
    /// Create a CloudFront client from shared AWS configuration.
    #[must_use]
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

fn invalidation_batch(reference: &str, paths: &[String]) -> Result<InvalidationBatch> {
    let Ok(quantity) = i32::try_from(paths.len()) else {
        tracerr!(Err::InvalidRequest, "too many invalidation paths: {}", paths.len());
    };
    let paths = match Paths::builder().quantity(quantity).set_items(Some(paths.to_vec())).build() {
        Ok(paths) => paths,
        Err(e) => tracerr!(Err::InvalidRequest, "invalid invalidation paths: {}", e),
    };
    match InvalidationBatch::builder().paths(paths).caller_reference(reference).build() {
        Ok(batch) => Ok(batch),
        Err(e) => tracerr!(Err::InvalidRequest, "invalid invalidation batch: {}", e),
    }
}

impl CacheInvalidation for CloudFront {
    async fn invalidate(&self, distribution: &str, reference: &str, paths: &[String]) -> Result<()> {
        let batch = invalidation_batch(reference, paths)?;

        let output = match self
            .client
            .create_invalidation()
            .distribution_id(distribution)
            .invalidation_batch(batch)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) => tracerr!(
                Err::RequestError,
                "CreateInvalidation for {} failed: {}",
                distribution,
                DisplayErrorContext(&e)
            ),
        };

        if let Some(invalidation) = output.invalidation() {
            tracing::debug!(
                id = invalidation.id(),
                status = invalidation.status(),
                "invalidation created"
            );
        }
        Ok(())
    }
}
