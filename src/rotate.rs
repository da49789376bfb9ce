//! # Rotation
//!
//! Composes the four stages of a rotation in strict sequence: provision a key, export its public
//! half, publish it into the key set, invalidate the edge cache. A failure in any of the first
//! three stages aborts the rotation. Rotation is not idempotent: running it again after a failure
//! provisions another new key, and a key created by an aborted rotation is left unpublished.

use serde::{Serialize, Serializer};

use crate::config::Config;
use crate::error::Err;
use crate::export::export;
use crate::invalidate::invalidate;
use crate::jwk::PublicKeyJwk;
use crate::provider::{CacheInvalidation, Clock, KeyManagement, ObjectStore, SystemClock};
use crate::provision::{provision, SigningKey};
use crate::publish::publish;
use crate::{RotationRequest, Result};

/// Stage an auxiliary action belongs to.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Granting the signer principal use of the new key.
    Grant,
    /// Invalidating the edge cache.
    Invalidation,
}

/// A best-effort action that failed without failing the rotation.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Warning {
    /// Stage the action belongs to.
    pub stage: Stage,

    /// Error code of the failure.
    #[serde(serialize_with = "code_str")]
    pub code: Err,

    /// Description of the failure.
    pub message: String,
}

fn code_str<S: Serializer>(code: &Err, serializer: S) -> core::result::Result<S::Ok, S::Error> {
    serializer.collect_str(code)
}

/// Outcome of a completed rotation.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct RotationOutcome {
    /// The request the rotation ran for.
    pub request: RotationRequest,

    /// The key created.
    pub key: SigningKey,

    /// The JWK published for the key.
    pub jwk: PublicKeyJwk,

    /// Name of the backup of the prior key set.
    pub backup: String,

    /// Number of keys now published.
    pub keys: usize,

    /// Auxiliary actions that failed.
    pub warnings: Vec<Warning>,
}

impl RotationOutcome {
    /// Returns `true` if every auxiliary action succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Runs rotations against injected providers.
#[derive(Clone, Debug)]
pub struct Rotator<K, S, C, T = SystemClock> {
    kms: K,
    store: S,
    cdn: C,
    clock: T,
    config: Config,
}

impl<K, S, C> Rotator<K, S, C, SystemClock>
where
    K: KeyManagement,
    S: ObjectStore,
    C: CacheInvalidation,
{
    /// Create a rotator using the system clock.
    pub const fn new(kms: K, store: S, cdn: C, config: Config) -> Self {
        Self {
            kms,
            store,
            cdn,
            clock: SystemClock,
            config,
        }
    }
}

impl<K, S, C, T> Rotator<K, S, C, T>
where
    K: KeyManagement,
    S: ObjectStore,
    C: CacheInvalidation,
    T: Clock,
{
    /// Replace the clock used for backup names and invalidation references.
    pub fn with_clock<U: Clock>(self, clock: U) -> Rotator<K, S, C, U> {
        Rotator {
            kms: self.kms,
            store: self.store,
            cdn: self.cdn,
            clock,
            config: self.config,
        }
    }

    /// Rotation configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Rotate the signing key for the key set described by `request`.
    ///
    /// # Errors
    ///
    /// * `Err::ProvisionFailed` - No key was created.
    /// * `Err::ExportFailed`, `Err::InvalidKey` - A key was created but could not be exported; it
    ///   is left unpublished.
    /// * `Err::ReadFailed`, `Err::InvalidKeySet`, `Err::BackupFailed` - The key set is unchanged.
    /// * `Err::PublishFailed` - The key set may need restoring from the backup.
    #[tracing::instrument(
        skip_all,
        fields(alias = %request.key_alias, container = %request.public_keys_bucket_name)
    )]
    pub async fn rotate(&self, request: &RotationRequest) -> Result<RotationOutcome> {
        let mut warnings = Vec::new();

        let key = provision(&self.kms, request, &self.config, &mut warnings).await?;
        let jwk = export(&self.kms, &key).await?;

        let published = publish(
            &self.store,
            &request.public_keys_bucket_name,
            &jwk,
            &self.config,
            self.clock.now(),
        )
        .await?;

        if let Err(e) = invalidate(
            &self.cdn,
            &request.cloudfront_distribution_id,
            &self.config.invalidation_paths(),
            self.clock.now(),
        )
        .await
        {
            warnings.push(Warning {
                stage: Stage::Invalidation,
                code: e.code().unwrap_or(Err::InvalidationFailed),
                message: e.to_string(),
            });
        }

        tracing::info!(key_id = %key.key_id, warnings = warnings.len(), "rotation complete");

        Ok(RotationOutcome {
            request: request.clone(),
            key,
            jwk,
            backup: published.backup,
            keys: published.keys,
            warnings,
        })
    }
}
