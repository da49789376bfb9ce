//! # JSON Web Keys
//!
//! Public key representations published in a key set.
//!
//! See:
//!
//! - <https://www.rfc-editor.org/rfc/rfc7517>
//! - <https://www.rfc-editor.org/rfc/rfc7518#section-6.2>

use std::fmt::{self, Display};

use base64ct::{Base64UrlUnpadded, Encoding};
use p256::pkcs8::DecodePublicKey;
use p256::PublicKey;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Err;
use crate::{tracerr, Result};

const PEM_PREFIX: &[u8] = b"-----BEGIN";
const P256_COORDINATE_LEN: usize = 32;

/// Signing algorithms a published key may be used with.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum Algorithm {
    /// ECDSA using P-256 and SHA-256.
    #[default]
    ES256,
}

impl Algorithm {
    /// The JWK `crv` value for keys used with this algorithm.
    #[must_use]
    pub const fn curve(self) -> &'static str {
        match self {
            Self::ES256 => "P-256",
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ES256 => write!(f, "ES256"),
        }
    }
}

/// A single entry of a key set.
///
/// Members this type does not model are kept in `other`, so entries read from a published key
/// set are written back unchanged.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PublicKeyJwk {
    /// Key ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Key type.
    pub kty: String,

    /// Intended use.
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    /// Algorithm the key is used with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// Cryptographic curve type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// X coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// Y coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    /// Any other members of the key.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl PublicKeyJwk {
    /// Convert a public key in SubjectPublicKeyInfo form into a signing JWK.
    ///
    /// `spki` may be DER or PEM encoded. The returned key has `kid` set to `kid`, `kty` set to
    /// `EC` and `use` set to `sig`, whatever the conversion itself produced.
    ///
    /// # Errors
    ///
    /// * `Err::ExportFailed` - The bytes are not a public key for the curve `alg` uses.
    /// * `Err::InvalidKey` - The converted key has malformed coordinates.
    pub fn from_spki(spki: &[u8], kid: &str, alg: Algorithm) -> Result<Self> {
        let public_key = match alg {
            Algorithm::ES256 => decode_p256(spki)?,
        };

        let mut jwk: Self = match serde_json::from_str(&public_key.to_jwk_string()) {
            Ok(jwk) => jwk,
            Err(e) => tracerr!(Err::ExportFailed, "unable to read converted key: {}", e),
        };
        jwk.kid = Some(kid.to_string());
        jwk.kty = "EC".to_string();
        jwk.use_ = Some("sig".to_string());

        jwk.check(alg)?;
        Ok(jwk)
    }

    /// Check the key has the structure required by `alg`.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidKey` - The key type, curve or coordinates do not fit the algorithm.
    pub fn check(&self, alg: Algorithm) -> Result<()> {
        if self.kty != "EC" {
            tracerr!(Err::InvalidKey, "expected key type EC, got {}", self.kty);
        }
        if self.crv.as_deref() != Some(alg.curve()) {
            tracerr!(Err::InvalidKey, "key curve does not match {}", alg);
        }
        check_coordinate("x", self.x.as_deref())?;
        check_coordinate("y", self.y.as_deref())?;
        self.to_public_key().map(|_| ())
    }

    /// Decode the curve point the key describes.
    ///
    /// Only `kty`, `crv`, `x` and `y` take part; metadata such as `kid` and `use` is ignored.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidKey` - The members do not describe a P-256 point.
    pub fn to_public_key(&self) -> Result<PublicKey> {
        let point = json!({"kty": self.kty, "crv": self.crv, "x": self.x, "y": self.y});
        match PublicKey::from_jwk_str(&point.to_string()) {
            Ok(key) => Ok(key),
            Err(e) => tracerr!(Err::InvalidKey, "key is not a P-256 point: {}", e),
        }
    }
}

fn decode_p256(spki: &[u8]) -> Result<PublicKey> {
    if spki.starts_with(PEM_PREFIX) {
        let pem = match std::str::from_utf8(spki) {
            Ok(pem) => pem,
            Err(e) => tracerr!(Err::ExportFailed, "public key PEM is not valid UTF-8: {}", e),
        };
        return match PublicKey::from_public_key_pem(pem) {
            Ok(key) => Ok(key),
            Err(e) => tracerr!(Err::ExportFailed, "unable to decode P-256 public key PEM: {}", e),
        };
    }
    match PublicKey::from_public_key_der(spki) {
        Ok(key) => Ok(key),
        Err(e) => tracerr!(Err::ExportFailed, "unable to decode P-256 public key DER: {}", e),
    }
}

fn check_coordinate(name: &str, value: Option<&str>) -> Result<()> {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        tracerr!(Err::InvalidKey, "missing {} coordinate", name);
    };
    match Base64UrlUnpadded::decode_vec(value) {
        Ok(raw) if raw.len() == P256_COORDINATE_LEN => Ok(()),
        Ok(raw) => tracerr!(
            Err::InvalidKey,
            "invalid {} coordinate length. Expected {} bytes, got {}",
            name,
            P256_COORDINATE_LEN,
            raw.len()
        ),
        Err(e) => tracerr!(Err::InvalidKey, "invalid {} coordinate encoding: {}", name, e),
    }
}

/// A JSON Web Key Set document.
///
/// Entries are held as raw JSON so keys read from a published set are written back exactly as
/// they were, including members this crate does not model and explicit `null`s.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct KeySet {
    /// Keys in publication order.
    pub keys: Vec<Value>,

    /// Any other top-level members of the document.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl KeySet {
    /// Parse a key set document.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidKeySet` - The document is not JSON, has no `keys` array, or an entry is not
    ///   a JWK.
    pub fn from_slice(doc: &[u8]) -> Result<Self> {
        let set: Self = match serde_json::from_slice(doc) {
            Ok(set) => set,
            Err(e) => tracerr!(Err::InvalidKeySet, "key set document is malformed: {}", e),
        };
        for (i, entry) in set.keys.iter().enumerate() {
            if let Err(e) = PublicKeyJwk::deserialize(entry) {
                tracerr!(Err::InvalidKeySet, "key set entry {} is not a JWK: {}", i, e);
            }
        }
        Ok(set)
    }

    /// Serialize the key set document.
    ///
    /// # Errors
    ///
    /// * `Err::PublishFailed` - The key set cannot be serialized.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        match serde_json::to_vec(self) {
            Ok(doc) => Ok(doc),
            Err(e) => tracerr!(Err::PublishFailed, "unable to serialize key set: {}", e),
        }
    }

    /// Find a key by ID.
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&Value> {
        self.keys.iter().find(|k| k.get("kid").and_then(Value::as_str) == Some(kid))
    }

    /// Append a key. Keys are not de-duplicated.
    ///
    /// # Errors
    ///
    /// * `Err::PublishFailed` - The key cannot be serialized.
    pub fn push(&mut self, jwk: &PublicKeyJwk) -> Result<()> {
        match serde_json::to_value(jwk) {
            Ok(entry) => {
                self.keys.push(entry);
                Ok(())
            }
            Err(e) => tracerr!(Err::PublishFailed, "unable to serialize key: {}", e),
        }
    }

    /// Number of keys in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the set holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
