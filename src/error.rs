//! # Errors
//!
//! Error type shared by the rotation workflow and the provider traits, including implementations
//! of those traits in other crates.

use std::fmt::Display;

use thiserror::Error;

/// Log an error and return early with an error code and formatted context.
///
/// # Example
/// ```
/// use jwks_rotate::error::Err;
/// use jwks_rotate::{tracerr, Result};
///
/// fn with_msg() -> Result<()> {
///     tracerr!(Err::InvalidRequest, "missing field: {}", "keyAlias")
/// }
///
/// fn no_msg() -> Result<()> {
///     tracerr!(Err::InvalidRequest)
/// }
/// ```
#[macro_export]
macro_rules! tracerr {
    // with context
    ($code:expr, $($msg:tt)*) => {
        {
        use $crate::error::Context as _;
        tracing::error!($($msg)*);
        return Err($code).context(format!($($msg)*));
        }
    };
    // no context
    ($code:expr) => {
        {
        tracing::error!("{}", $code);
        return Err($code.into());
        }
    }
}

/// Public error type.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct Error(#[from] anyhow::Error);

impl Error {
    /// Render the error as a JSON body: the error code and a description.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.0.root_cause().to_string(),
            "error_description": self.to_string(),
        })
    }

    /// Returns true if the error carries the code `err`.
    #[must_use]
    pub fn is(&self, err: Err) -> bool {
        self.code() == Some(err)
    }

    /// The error code carried by this error, if any.
    #[must_use]
    pub fn code(&self) -> Option<Err> {
        self.0.downcast_ref::<Err>().copied()
    }
}

/// Typed error codes.
#[derive(Clone, Copy, Error, Debug, PartialEq, Eq)]
pub enum Err {
    /// The rotation request is missing a field or a field is blank.
    #[error("invalid_request")]
    InvalidRequest,

    /// Environment configuration could not be resolved.
    #[error("invalid_config")]
    InvalidConfig,

    /// The key management service refused to create the signing key.
    #[error("provision_failed")]
    ProvisionFailed,

    /// The key management service refused to issue a grant on the new key.
    #[error("grant_failed")]
    GrantFailed,

    /// The public half of the new key could not be fetched or converted to a JWK.
    #[error("export_failed")]
    ExportFailed,

    /// The JWK produced for a key is structurally invalid.
    #[error("invalid_key")]
    InvalidKey,

    /// The published key set could not be read.
    #[error("read_failed")]
    ReadFailed,

    /// The published key set is not a valid JWKS document.
    #[error("invalid_key_set")]
    InvalidKeySet,

    /// The backup copy of the key set could not be written.
    #[error("backup_failed")]
    BackupFailed,

    /// The updated key set could not be written back to its canonical name.
    #[error("publish_failed")]
    PublishFailed,

    /// The edge cache refused the invalidation request.
    #[error("invalidation_failed")]
    InvalidationFailed,

    /// A request to a downstream service failed to connect or get a response.
    #[error("request_error")]
    RequestError,

    /// The requested object or key does not exist.
    #[error("not_found")]
    NotFound,
}

/// Context is used to decorate errors with useful context information.
pub trait Context<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Adds context to the error.
    ///
    /// # Errors
    ///
    /// * Original error with context appended.
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static;
}

impl<T, E> Context<T, E> for core::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static,
    {
        match self {
            Ok(ok) => Ok(ok),
            Err(e) => Err(Error(anyhow::Error::from(e).context(context))),
        }
    }
}

impl From<Err> for Error {
    fn from(error: Err) -> Self {
        Self(error.into())
    }
}

impl From<base64ct::Error> for Error {
    fn from(err: base64ct::Error) -> Self {
        Self(err.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self(err.into())
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    use super::*;
    use crate::Result;

    #[test]
    fn base_err() {
        let err: Error = Err::ReadFailed.into();

        assert_eq!(err.to_json(), json!({"error":"read_failed","error_description":"read_failed"}));
        assert!(err.is(Err::ReadFailed));
        assert!(!err.is(Err::BackupFailed));
    }

    #[test]
    fn context_err() {
        let res: Result<()> = Err(Err::BackupFailed).context("unable to write jwks backup");
        let err = res.expect_err("expected error");

        assert_eq!(
            err.to_json(),
            json!({"error":"backup_failed","error_description":"unable to write jwks backup"})
        );
        assert_eq!(err.code(), Some(Err::BackupFailed));
    }

    #[test]
    fn foreign_err_has_no_code() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{").expect_err("bad json").into();
        assert_eq!(err.code(), None);
    }

    #[test]
    fn macro_returns_code_and_message() {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::ERROR).finish();
        let res = tracing::subscriber::with_default(subscriber, run_macro);

        let Err(e) = res else {
            panic!("expected error");
        };

        assert_eq!(e.to_string(), "missing field: keyAlias");
        assert!(e.is(Err::InvalidRequest));
    }

    fn run_macro() -> Result<()> {
        tracerr!(Err::InvalidRequest, "missing field: {}", "keyAlias")
    }
}
