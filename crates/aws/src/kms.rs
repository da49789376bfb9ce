use aws_config::SdkConfig;
use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::types::{self, KeyUsageType, Tag};
use aws_sdk_kms::Client;
use jwks_rotate::error::Err;
use jwks_rotate::provider::{Grant, GrantOperation, KeyCurve, KeySpec, KeyUsage};
use jwks_rotate::{tracerr, KeyManagement, Result};

/// AWS KMS key management.
#[derive(Clone, Debug)]
pub struct Kms {
    client: Client,
}

impl Kms {
    /// Create a KMS client from shared AWS configuration.
    #[must_use]
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

const fn key_spec(curve: KeyCurve) -> types::KeySpec {
    match curve {
        KeyCurve::P256 => types::KeySpec::EccNistP256,
    }
}

const fn key_usage(usage: KeyUsage) -> KeyUsageType {
    match usage {
        KeyUsage::SignVerify => KeyUsageType::SignVerify,
    }
}

const fn grant_operation(op: GrantOperation) -> types::GrantOperation {
    match op {
        GrantOperation::DescribeKey => types::GrantOperation::DescribeKey,
        GrantOperation::GetPublicKey => types::GrantOperation::GetPublicKey,
        GrantOperation::Sign => types::GrantOperation::Sign,
        GrantOperation::Verify => types::GrantOperation::Verify,
    }
}

impl KeyManagement for Kms {
    async fn create_key(&self, spec: &KeySpec) -> Result<String> {
        let mut tags = Vec::with_capacity(spec.tags.len());
        for (key, value) in &spec.tags {
            match Tag::builder().tag_key(key).tag_value(value).build() {
                Ok(tag) => tags.push(tag),
                Err(e) => tracerr!(Err::InvalidRequest, "invalid key tag {}: {}", key, e),
            }
        }

        let response = match self
            .client
            .create_key()
            .key_spec(key_spec(spec.curve))
            .key_usage(key_usage(spec.usage))
            .description(&spec.description)
            .set_tags(Some(tags))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => tracerr!(Err::RequestError, "CreateKey failed: {}", DisplayErrorContext(&e)),
        };

        let Some(metadata) = response.key_metadata() else {
            tracerr!(Err::RequestError, "CreateKey response has no key metadata");
        };
        Ok(metadata.key_id().to_string())
    }

    async fn create_grant(&self, grant: &Grant) -> Result<()> {
        let operations = grant.operations.iter().copied().map(grant_operation).collect();
        if let Err(e) = self
            .client
            .create_grant()
            .key_id(&grant.key_id)
            .grantee_principal(&grant.grantee)
            .name(&grant.name)
            .set_operations(Some(operations))
            .send()
            .await
        {
            tracerr!(Err::RequestError, "CreateGrant failed: {}", DisplayErrorContext(&e));
        }
        Ok(())
    }

    async fn get_public_key(&self, key_id: &str) -> Result<Vec<u8>> {
        let response = match self.client.get_public_key().key_id(key_id).send().await {
            Ok(response) => response,
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_not_found_exception()) {
                    tracerr!(Err::NotFound, "key {} not found", key_id);
                }
                tracerr!(Err::RequestError, "GetPublicKey failed: {}", DisplayErrorContext(&e));
            }
        };

        let Some(public_key) = response.public_key() else {
            tracerr!(Err::RequestError, "GetPublicKey response for {} has no key", key_id);
        };
        Ok(public_key.as_ref().to_vec())
    }
}
