//! # Key Provisioner
//!
//! Creates the new signing key and authorizes the designated signer to use it.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Err;
use crate::jwk::Algorithm;
use crate::provider::{Grant, GrantOperation, KeyManagement, KeySpec};
use crate::rotate::{Stage, Warning};
use crate::{tracerr, RotationRequest, Result};

/// Operations granted to the signer principal.
pub const SIGNER_OPERATIONS: [GrantOperation; 4] = [
    GrantOperation::DescribeKey,
    GrantOperation::GetPublicKey,
    GrantOperation::Sign,
    GrantOperation::Verify,
];

/// A signing key created by a rotation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SigningKey {
    /// Provider-assigned key ID. Published as the JWK `kid`.
    pub key_id: String,

    /// Specification the key was created with.
    pub spec: KeySpec,

    /// Algorithm the key signs with.
    pub alg: Algorithm,

    /// Grants confirmed by the provider.
    pub grants: Vec<Grant>,
}

/// The key specification used for every rotated key.
#[must_use]
pub fn key_spec(request: &RotationRequest, config: &Config) -> KeySpec {
    KeySpec {
        description: format!("JWKS signing key for {}", request.key_alias),
        tags: vec![
            ("purpose".to_string(), config.key_purpose_tag.clone()),
            ("alias".to_string(), request.key_alias.clone()),
        ],
        ..KeySpec::default()
    }
}

/// Create a P-256 sign/verify key and grant the request's signer principal use of it.
///
/// The grant is best effort: a rejected grant is pushed onto `warnings` and the key is still
/// returned, without that grant recorded against it.
///
/// # Errors
///
/// * `Err::ProvisionFailed` - The key management service did not create the key.
pub async fn provision(
    kms: &impl KeyManagement, request: &RotationRequest, config: &Config,
    warnings: &mut Vec<Warning>,
) -> Result<SigningKey> {
    let spec = key_spec(request, config);
    let key_id = match kms.create_key(&spec).await {
        Ok(key_id) => key_id,
        Err(e) => tracerr!(Err::ProvisionFailed, "unable to create signing key: {}", e),
    };
    tracing::info!(key_id = %key_id, alias = %request.key_alias, "signing key created");

    let grant = Grant {
        name: format!("Role {} can Sign with key", request.can_sign_role_arn),
        key_id: key_id.clone(),
        grantee: request.can_sign_role_arn.clone(),
        operations: SIGNER_OPERATIONS.to_vec(),
    };

    let mut grants = Vec::with_capacity(1);
    match kms.create_grant(&grant).await {
        Ok(()) => {
            tracing::info!(key_id = %key_id, grantee = %grant.grantee, "signing grant issued");
            grants.push(grant);
        }
        Err(e) => {
            tracing::warn!(key_id = %key_id, grantee = %grant.grantee, "grant failed: {e}");
            warnings.push(Warning {
                stage: Stage::Grant,
                code: Err::GrantFailed,
                message: format!("unable to grant {} use of key {key_id}: {e}", grant.grantee),
            });
        }
    }

    Ok(SigningKey {
        key_id,
        spec,
        alg: Algorithm::ES256,
        grants,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{KeyCurve, KeyUsage};
    use crate::test_utils::{request, MemoryKms};

    #[tokio::test]
    async fn creates_key_and_grant() {
        let kms = MemoryKms::new();
        let mut warnings = Vec::new();

        let key = provision(&kms, &request(), &Config::default(), &mut warnings)
            .await
            .expect("should provision");

        assert!(warnings.is_empty());
        assert_eq!(key.spec.curve, KeyCurve::P256);
        assert_eq!(key.spec.usage, KeyUsage::SignVerify);
        assert!(key.spec.tags.contains(&("purpose".to_string(), "auto-rotate-test".to_string())));

        let grants = kms.grants();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].key_id, key.key_id);
        assert_eq!(grants[0].grantee, request().can_sign_role_arn);
        assert_eq!(grants[0].operations, SIGNER_OPERATIONS.to_vec());
        assert_eq!(key.grants, grants);
    }

    #[tokio::test]
    async fn create_failure_is_fatal() {
        let kms = MemoryKms::new();
        kms.fail_create(true);

        let mut warnings = Vec::new();
        let err = provision(&kms, &request(), &Config::default(), &mut warnings)
            .await
            .expect_err("should fail");

        assert!(err.is(Err::ProvisionFailed));
        assert!(kms.grants().is_empty());
    }

    #[tokio::test]
    async fn grant_failure_is_a_warning() {
        let kms = MemoryKms::new();
        kms.fail_grant(true);

        let mut warnings = Vec::new();
        let key = provision(&kms, &request(), &Config::default(), &mut warnings)
            .await
            .expect("should still provision");

        assert!(key.grants.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].stage, Stage::Grant);
        assert_eq!(warnings[0].code, Err::GrantFailed);
    }
}
