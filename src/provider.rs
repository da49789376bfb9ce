//! # Provider Traits
//!
//! Narrow views of the external services a rotation depends on. Implementations are injected into
//! a [`crate::Rotator`], so the workflow can run against cloud services or against the in-memory
//! doubles in [`crate::test_utils`].

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Asymmetric key specification the key management service supports for signing keys.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum KeyCurve {
    /// NIST P-256 (secp256r1).
    #[default]
    #[serde(rename = "ECC_NIST_P256")]
    P256,
}

/// Permitted uses of a key.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum KeyUsage {
    /// The key may only sign and verify.
    #[default]
    #[serde(rename = "SIGN_VERIFY")]
    SignVerify,
}

/// Key creation parameters.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct KeySpec {
    /// Curve of the key pair.
    pub curve: KeyCurve,

    /// Permitted uses.
    pub usage: KeyUsage,

    /// Free-text description stored with the key.
    pub description: String,

    /// Tags for operational identification, as `(key, value)` pairs.
    pub tags: Vec<(String, String)>,
}

/// Operations a grant can permit.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum GrantOperation {
    /// Read key metadata.
    DescribeKey,
    /// Fetch the public half of the key.
    GetPublicKey,
    /// Sign with the key.
    Sign,
    /// Verify with the key.
    Verify,
}

/// A scoped authorization for one principal to use one key.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Grant {
    /// Name of the grant.
    pub name: String,

    /// Key the grant applies to.
    pub key_id: String,

    /// Principal receiving the grant.
    pub grantee: String,

    /// Operations permitted.
    pub operations: Vec<GrantOperation>,
}

/// Key management service: creates keys, issues grants and exports public keys.
pub trait KeyManagement: Send + Sync {
    /// Create a new asymmetric key, returning the provider-assigned key ID.
    fn create_key(&self, spec: &KeySpec) -> impl Future<Output = Result<String>> + Send;

    /// Issue a grant on an existing key.
    fn create_grant(&self, grant: &Grant) -> impl Future<Output = Result<()>> + Send;

    /// Fetch the public half of a key as SubjectPublicKeyInfo (DER) bytes.
    fn get_public_key(&self, key_id: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Durable object store holding key set documents and their backups.
pub trait ObjectStore: Send + Sync {
    /// Read the named object from a container.
    ///
    /// A missing object is an error (`Err::NotFound` by convention).
    fn get(&self, container: &str, name: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Write (create or replace) the named object in a container.
    fn put(
        &self, container: &str, name: &str, body: Vec<u8>, content_type: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Edge cache in front of the object store.
pub trait CacheInvalidation: Send + Sync {
    /// Evict `paths` from the distribution. `reference` must be unique per request so repeated
    /// invalidations are not collapsed by the provider.
    fn invalidate(
        &self, distribution: &str, reference: &str, paths: &[String],
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
