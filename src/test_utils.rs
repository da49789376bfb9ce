//! In-memory providers for exercising rotations without cloud services.
//!
//! Each double shares its state between clones, so a test can keep a handle after moving a clone
//! into a [`crate::Rotator`] and inspect what the rotation did. Failure switches let tests drive
//! every error path of the workflow.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeZone, Utc};
use p256::pkcs8::EncodePublicKey;
use p256::{PublicKey, SecretKey};
use rand::rngs::OsRng;

use crate::error::{Context, Err};
use crate::provider::{CacheInvalidation, Clock, Grant, KeyManagement, KeySpec, ObjectStore};
use crate::{RotationRequest, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A valid rotation request for tests.
#[must_use]
pub fn request() -> RotationRequest {
    RotationRequest {
        key_alias: "token-signer".to_string(),
        can_sign_role_arn: "arn:aws:iam::123456789012:role/signer".to_string(),
        key_management_role_arn: "arn:aws:iam::123456789012:role/key-admin".to_string(),
        public_keys_bucket_name: "public-keys".to_string(),
        cloudfront_distribution_id: "E2EXAMPLE".to_string(),
    }
}

#[derive(Default)]
struct KmsState {
    keys: HashMap<String, (KeySpec, PublicKey)>,
    grants: Vec<Grant>,
    corrupted: Vec<String>,
    corrupt_all: bool,
    fail_create: bool,
    fail_grant: bool,
}

/// Key management service generating real P-256 key pairs in memory.
#[derive(Clone, Default)]
pub struct MemoryKms {
    state: Arc<Mutex<KmsState>>,
}

impl MemoryKms {
    /// Create an empty key management service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make key creation fail.
    pub fn fail_create(&self, fail: bool) {
        lock(&self.state).fail_create = fail;
    }

    /// Make grant issuance fail.
    pub fn fail_grant(&self, fail: bool) {
        lock(&self.state).fail_grant = fail;
    }

    /// Return garbage instead of the public key for `key_id`.
    pub fn corrupt_public_key(&self, key_id: &str) {
        lock(&self.state).corrupted.push(key_id.to_string());
    }

    /// Return garbage instead of every public key.
    pub fn corrupt_all_public_keys(&self, corrupt: bool) {
        lock(&self.state).corrupt_all = corrupt;
    }

    /// IDs of keys created so far.
    #[must_use]
    pub fn key_ids(&self) -> Vec<String> {
        lock(&self.state).keys.keys().cloned().collect()
    }

    /// Specification a key was created with.
    #[must_use]
    pub fn spec(&self, key_id: &str) -> Option<KeySpec> {
        lock(&self.state).keys.get(key_id).map(|(spec, _)| spec.clone())
    }

    /// Public half of a key.
    #[must_use]
    pub fn public_key(&self, key_id: &str) -> Option<PublicKey> {
        lock(&self.state).keys.get(key_id).map(|(_, public)| *public)
    }

    /// Grants issued so far, in order.
    #[must_use]
    pub fn grants(&self) -> Vec<Grant> {
        lock(&self.state).grants.clone()
    }
}

impl KeyManagement for MemoryKms {
    async fn create_key(&self, spec: &KeySpec) -> Result<String> {
        let mut state = lock(&self.state);
        if state.fail_create {
            return Err(Err::ProvisionFailed).context("LimitExceededException: key quota reached");
        }
        let key_id = uuid::Uuid::new_v4().to_string();
        let public = SecretKey::random(&mut OsRng).public_key();
        state.keys.insert(key_id.clone(), (spec.clone(), public));
        Ok(key_id)
    }

    async fn create_grant(&self, grant: &Grant) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_grant {
            return Err(Err::GrantFailed).context("InvalidArnException: grantee not found");
        }
        if !state.keys.contains_key(&grant.key_id) {
            return Err(Err::NotFound).context(format!("key {} not found", grant.key_id));
        }
        state.grants.push(grant.clone());
        Ok(())
    }

    async fn get_public_key(&self, key_id: &str) -> Result<Vec<u8>> {
        let state = lock(&self.state);
        let Some((_, public)) = state.keys.get(key_id) else {
            return Err(Err::NotFound).context(format!("key {key_id} not found"));
        };
        if state.corrupt_all || state.corrupted.iter().any(|k| k == key_id) {
            return Ok(b"not a public key".to_vec());
        }
        match public.to_public_key_der() {
            Ok(der) => Ok(der.as_bytes().to_vec()),
            Err(e) => Err(Err::RequestError).context(format!("unable to encode public key: {e}")),
        }
    }
}

#[derive(Default)]
struct StoreState {
    objects: HashMap<(String, String), Vec<u8>>,
    writes: Vec<(String, String)>,
    fail_writes: Vec<String>,
    fail_reads: bool,
}

/// Object store holding named objects in memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    /// Create an empty object store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording a write.
    pub fn insert(&self, container: &str, name: &str, body: Vec<u8>) {
        lock(&self.state).objects.insert((container.to_string(), name.to_string()), body);
    }

    /// Current contents of an object.
    #[must_use]
    pub fn object(&self, container: &str, name: &str) -> Option<Vec<u8>> {
        lock(&self.state).objects.get(&(container.to_string(), name.to_string())).cloned()
    }

    /// Names of all objects in a container, sorted.
    #[must_use]
    pub fn names(&self, container: &str) -> Vec<String> {
        let state = lock(&self.state);
        let mut names: Vec<String> = state
            .objects
            .keys()
            .filter(|(c, _)| c == container)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Successful writes, in order, as `(container, name)`.
    #[must_use]
    pub fn writes(&self) -> Vec<(String, String)> {
        lock(&self.state).writes.clone()
    }

    /// Fail writes to any object whose name contains `pattern`.
    pub fn fail_writes_matching(&self, pattern: &str) {
        lock(&self.state).fail_writes.push(pattern.to_string());
    }

    /// Make every read fail.
    pub fn fail_reads(&self, fail: bool) {
        lock(&self.state).fail_reads = fail;
    }
}

impl ObjectStore for MemoryStore {
    async fn get(&self, container: &str, name: &str) -> Result<Vec<u8>> {
        let state = lock(&self.state);
        if state.fail_reads {
            return Err(Err::RequestError).context("connection reset");
        }
        match state.objects.get(&(container.to_string(), name.to_string())) {
            Some(body) => Ok(body.clone()),
            None => Err(Err::NotFound).context(format!("{container}/{name} not found")),
        }
    }

    async fn put(
        &self, container: &str, name: &str, body: Vec<u8>, _content_type: &str,
    ) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_writes.iter().any(|p| name.contains(p.as_str())) {
            return Err(Err::RequestError).context(format!("AccessDenied writing {name}"));
        }
        state.objects.insert((container.to_string(), name.to_string()), body);
        state.writes.push((container.to_string(), name.to_string()));
        Ok(())
    }
}

/// An invalidation accepted by [`RecordingInvalidator`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invalidation {
    /// Distribution invalidated.
    pub distribution: String,
    /// Caller reference.
    pub reference: String,
    /// Paths evicted.
    pub paths: Vec<String>,
}

#[derive(Default)]
struct CdnState {
    requests: Vec<Invalidation>,
    fail: bool,
}

/// Edge cache that records invalidation requests.
#[derive(Clone, Default)]
pub struct RecordingInvalidator {
    state: Arc<Mutex<CdnState>>,
}

impl RecordingInvalidator {
    /// Create an invalidator with no recorded requests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make invalidation requests fail.
    pub fn fail(&self, fail: bool) {
        lock(&self.state).fail = fail;
    }

    /// Accepted requests, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Invalidation> {
        lock(&self.state).requests.clone()
    }
}

impl CacheInvalidation for RecordingInvalidator {
    async fn invalidate(&self, distribution: &str, reference: &str, paths: &[String]) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail {
            return Err(Err::RequestError).context("TooManyInvalidationsInProgress");
        }
        state.requests.push(Invalidation {
            distribution: distribution.to_string(),
            reference: reference.to_string(),
            paths: paths.to_vec(),
        });
        Ok(())
    }
}

/// A clock stopped at a fixed instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).single().unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
