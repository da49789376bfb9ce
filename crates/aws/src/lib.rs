//! # JWKS Rotate for AWS
//!
//! Implementations of the `jwks-rotate` provider traits backed by AWS:
//!
//! - [`Kms`] creates signing keys and grants in AWS KMS and exports their public keys.
//! - [`S3Store`] reads and writes key set documents in an S3 bucket.
//! - [`CloudFront`] invalidates the key set in a CloudFront distribution.
//!
//! Clients are built from a shared [`aws_config::SdkConfig`], so region and credentials come from
//! the standard AWS configuration chain.

mod cloudfront;
mod kms;
mod s3;

use aws_config::{BehaviorVersion, SdkConfig};
pub use cloudfront::CloudFront;
use jwks_rotate::{Config, Rotator};
pub use kms::Kms;
pub use s3::S3Store;

/// Rotator wired to AWS providers.
pub type AwsRotator = Rotator<Kms, S3Store, CloudFront>;

/// Load AWS configuration from the environment.
pub async fn load_sdk_config() -> SdkConfig {
    aws_config::load_defaults(BehaviorVersion::latest()).await
}

/// Build a rotator from shared AWS configuration.
#[must_use]
pub fn rotator(sdk_config: &SdkConfig, config: Config) -> AwsRotator {
    Rotator::new(Kms::new(sdk_config), S3Store::new(sdk_config), CloudFront::new(sdk_config), config)
}
