//! # Rotation Request
//!
//! The typed input to a rotation. Requests are validated once, when they are constructed from an
//! untyped trigger body, and are immutable from then on.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Err;
use crate::{tracerr, Result};

/// Everything a caller supplies to rotate the signing key for one published key set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationRequest {
    /// Alias (human name) of the signing key being rotated.
    pub key_alias: String,

    /// Principal granted permission to sign with the new key.
    pub can_sign_role_arn: String,

    /// Principal permitted to manage the key.
    pub key_management_role_arn: String,

    /// Object store container holding the key set document.
    pub public_keys_bucket_name: String,

    /// Edge cache distribution serving the key set document.
    pub cloudfront_distribution_id: String,
}

impl RotationRequest {
    /// Parse and validate a JSON trigger body.
    ///
    /// Unknown fields are ignored.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidRequest` - The body is not a JSON object, or a required field is missing,
    ///   not a string, or blank.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let value: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => tracerr!(Err::InvalidRequest, "request body is not valid JSON: {}", e),
        };
        let Value::Object(fields) = value else {
            tracerr!(Err::InvalidRequest, "request body must be a JSON object")
        };

        let field = |name: &str| -> Result<String> {
            match fields.get(name) {
                Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
                Some(Value::String(_)) => tracerr!(Err::InvalidRequest, "{name} must not be blank"),
                Some(_) => tracerr!(Err::InvalidRequest, "{name} must be a string"),
                None => tracerr!(Err::InvalidRequest, "missing field: {name}"),
            }
        };

        Ok(Self {
            key_alias: field("keyAlias")?,
            can_sign_role_arn: field("canSignRoleArn")?,
            key_management_role_arn: field("keyManagementRoleArn")?,
            public_keys_bucket_name: field("publicKeysBucketName")?,
            cloudfront_distribution_id: field("cloudfrontDistributionId")?,
        })
    }
}

impl<'de> Deserialize<'de> for RotationRequest {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let body = serde_json::to_vec(&value).map_err(serde::de::Error::custom)?;
        Self::from_json(&body).map_err(serde::de::Error::custom)
    }
}
