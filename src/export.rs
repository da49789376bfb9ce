//! # Key Exporter
//!
//! Fetches the public half of a new signing key and converts it into the JWK verifiers will
//! select by `kid`.

use crate::error::Err;
use crate::jwk::PublicKeyJwk;
use crate::provider::KeyManagement;
use crate::provision::SigningKey;
use crate::{tracerr, Result};

/// Export the public half of `key` as a signing JWK with `kid` equal to the key ID.
///
/// There is no retry: any failure to fetch or convert the key aborts the rotation.
///
/// # Errors
///
/// * `Err::ExportFailed` - The public key could not be fetched or is not a key for the expected
///   curve.
/// * `Err::InvalidKey` - The converted key has malformed coordinates.
pub async fn export(kms: &impl KeyManagement, key: &SigningKey) -> Result<PublicKeyJwk> {
    let spki = match kms.get_public_key(&key.key_id).await {
        Ok(spki) => spki,
        Err(e) => tracerr!(Err::ExportFailed, "unable to get public key for {}: {}", key.key_id, e),
    };

    let jwk = PublicKeyJwk::from_spki(&spki, &key.key_id, key.alg)?;
    tracing::info!(key_id = %key.key_id, alg = %key.alg, "public key exported");

    Ok(jwk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::provision::provision;
    use crate::test_utils::{request, MemoryKms};

    async fn new_key(kms: &MemoryKms) -> SigningKey {
        provision(kms, &request(), &Config::default(), &mut Vec::new())
            .await
            .expect("should provision")
    }

    #[tokio::test]
    async fn exports_matching_jwk() {
        let kms = MemoryKms::new();
        let key = new_key(&kms).await;

        let jwk = export(&kms, &key).await.expect("should export");

        assert_eq!(jwk.kid.as_deref(), Some(key.key_id.as_str()));
        assert_eq!(jwk.kty, "EC");
        assert_eq!(jwk.use_.as_deref(), Some("sig"));

        let public = jwk.to_public_key().expect("should decode");
        assert_eq!(Some(public), kms.public_key(&key.key_id));
    }

    #[tokio::test]
    async fn unknown_key_fails() {
        let kms = MemoryKms::new();
        let mut key = new_key(&kms).await;
        key.key_id = "missing".to_string();

        let err = export(&kms, &key).await.expect_err("should fail");
        assert!(err.is(Err::ExportFailed));
    }

    #[tokio::test]
    async fn malformed_material_fails() {
        let kms = MemoryKms::new();
        let key = new_key(&kms).await;
        kms.corrupt_public_key(&key.key_id);

        let err = export(&kms, &key).await.expect_err("should fail");
        assert!(err.is(Err::ExportFailed));
    }
}
