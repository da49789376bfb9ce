//! # Trigger Handler
//!
//! Adapts an untyped trigger (a JSON request body) to a rotation and renders the result as a
//! status code and JSON body.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{Err, Error};
use crate::provider::{CacheInvalidation, Clock, KeyManagement, ObjectStore};
use crate::rotate::{RotationOutcome, Rotator};
use crate::RotationRequest;

/// Message returned with a successful rotation.
pub const SUCCESS_MESSAGE: &str = "signing key rotated";

/// Response to a trigger.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// HTTP-style status code.
    pub status_code: u16,

    /// JSON response body.
    pub body: String,
}

impl Response {
    /// Returns `true` for a successful rotation.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status_code == 200
    }

    fn success(outcome: &RotationOutcome) -> Self {
        let mut body = match serde_json::to_value(&outcome.request) {
            Ok(Value::Object(fields)) => fields,
            _ => serde_json::Map::new(),
        };
        body.insert("message".to_string(), json!(SUCCESS_MESSAGE));
        body.insert("kid".to_string(), json!(outcome.key.key_id));
        body.insert("backup".to_string(), json!(outcome.backup));
        body.insert("keys".to_string(), json!(outcome.keys));
        body.insert("warnings".to_string(), json!(outcome.warnings));

        Self {
            status_code: 200,
            body: Value::Object(body).to_string(),
        }
    }

    fn failure(err: &Error) -> Self {
        let status_code = if err.is(Err::InvalidRequest) { 400 } else { 500 };
        Self {
            status_code,
            body: err.to_json().to_string(),
        }
    }
}

/// Handle a rotation trigger with an optional JSON body.
pub async fn handle<K, S, C, T>(rotator: &Rotator<K, S, C, T>, body: Option<&[u8]>) -> Response
where
    K: KeyManagement,
    S: ObjectStore,
    C: CacheInvalidation,
    T: Clock,
{
    let Some(body) = body else {
        tracing::error!("rotation trigger has no body");
        return Response::failure(&Err::InvalidRequest.into());
    };
    let request = match RotationRequest::from_json(body) {
        Ok(request) => request,
        Err(e) => return Response::failure(&e),
    };

    match rotator.rotate(&request).await {
        Ok(outcome) => Response::success(&outcome),
        Err(e) => Response::failure(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_status() {
        let bad_request = Response::failure(&Err::InvalidRequest.into());
        assert_eq!(bad_request.status_code, 400);
        assert!(!bad_request.is_success());

        let server_error = Response::failure(&Err::ReadFailed.into());
        assert_eq!(server_error.status_code, 500);

        let body: Value = serde_json::from_str(&server_error.body).expect("json");
        assert_eq!(body["error"], json!("read_failed"));
    }
}
