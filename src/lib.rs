//! # JWKS Rotate
//!
//! Rotates an asymmetric signing key and republishes the JSON Web Key Set (JWKS) verifiers use
//! to check tokens signed with it. Older keys stay in the set; only a new key is added.
//!
//! A rotation runs four stages in strict sequence, each consuming the previous stage's output:
//!
//! 1. [`provision`] creates a P-256 sign/verify key and grants the signer principal use of it.
//! 2. [`export`] fetches the key's public half and converts it to a JWK with `kid` set to the
//!    provider's key ID.
//! 3. [`publish`] backs up the published key set under a timestamped name and writes it back
//!    with the new key appended.
//! 4. [`invalidate`] evicts the key set from the edge cache.
//!
//! External services are reached through the traits in [`provider`], so the workflow runs
//! unchanged against cloud services or the in-memory doubles in [`test_utils`].
//!
//! Rotations of the same key set must be serialized by the caller. The key set is updated by a
//! read followed by a write, with no locking.

pub mod config;
pub mod error;
pub mod export;
pub mod handler;
pub mod invalidate;
pub mod jwk;
pub mod provider;
pub mod provision;
pub mod publish;
mod request;
pub mod rotate;
pub mod test_utils;

pub use config::Config;
pub use error::{Err, Error};
pub use jwk::{Algorithm, KeySet, PublicKeyJwk};
pub use provider::{CacheInvalidation, Clock, KeyManagement, ObjectStore, SystemClock};
pub use provision::SigningKey;
pub use request::RotationRequest;
pub use rotate::{RotationOutcome, Rotator, Stage, Warning};

/// Result type for key rotation.
pub type Result<T, E = error::Error> = core::result::Result<T, E>;
