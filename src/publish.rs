//! # Key Set Publisher
//!
//! Adds a new key to the key set published in an object store container.
//!
//! The canonical document is read, checked, copied byte-for-byte to a timestamped backup, and only
//! then replaced by a version with the new key appended. There is no concurrency control: two
//! publishes against the same container that read the same document will each write a version
//! missing the other's key. Callers must serialize rotations of a container.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::Err;
use crate::jwk::{KeySet, PublicKeyJwk};
use crate::provider::ObjectStore;
use crate::{tracerr, Result};

/// Result of a successful publish.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Published {
    /// Name of the backup written before the canonical document was replaced.
    pub backup: String,

    /// Number of keys in the published set, including the new key.
    pub keys: usize,
}

// Short random suffix keeping backups written in the same millisecond apart.
fn backup_discriminator() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Publish `jwk` into the key set held in `container`.
///
/// `at` and a random suffix qualify the backup name, so every publish writes a new backup.
///
/// # Errors
///
/// * `Err::ReadFailed` - The key set could not be read. Nothing is written.
/// * `Err::InvalidKeySet` - The key set is not a valid JWKS document. Nothing is written.
/// * `Err::BackupFailed` - The backup could not be written. The canonical document is untouched.
/// * `Err::PublishFailed` - The updated key set could not be written. The backup holds the prior
///   state.
pub async fn publish(
    store: &impl ObjectStore, container: &str, jwk: &PublicKeyJwk, config: &Config,
    at: DateTime<Utc>,
) -> Result<Published> {
    let name = config.key_set_name.as_str();

    let current = match store.get(container, name).await {
        Ok(doc) => doc,
        Err(e) => tracerr!(Err::ReadFailed, "unable to read {} from {}: {}", name, container, e),
    };
    let mut key_set = KeySet::from_slice(&current)?;

    let backup = config.backup_name(at, &backup_discriminator());
    if let Err(e) = store.put(container, &backup, current, &config.content_type).await {
        tracerr!(Err::BackupFailed, "unable to write backup {} to {}: {}", backup, container, e);
    }
    tracing::info!(container, backup = %backup, keys = key_set.len(), "key set backed up");

    if let Some(kid) = jwk.kid.as_deref() {
        if key_set.find(kid).is_some() {
            tracing::warn!(container, kid, "key set already holds a key with this kid");
        }
    }
    key_set.push(jwk)?;

    let updated = key_set.to_vec()?;
    if let Err(e) = store.put(container, name, updated, &config.content_type).await {
        tracerr!(
            Err::PublishFailed,
            "unable to write {} to {}, restore from {}: {}",
            name,
            container,
            backup,
            e
        );
    }
    tracing::info!(container, keys = key_set.len(), "key set published");

    Ok(Published {
        backup,
        keys: key_set.len(),
    })
}
