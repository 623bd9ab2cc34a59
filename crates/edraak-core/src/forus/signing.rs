//! Canonical message and HMAC-SHA256 signature for ForUs requests
//!
//! # Wire contract
//!
//! The signed message is every field of [`ORDERED_HMAC_KEYS`], in that order,
//! written as `key=value` and joined with `;`. Missing fields contribute an
//! empty value. The signature is the lowercase hex HMAC-SHA256 of the message,
//! carried in the `forus_hmac` field.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::SIGNATURE_FIELD;
use crate::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Fields covered by the signature, in signing order
pub const ORDERED_HMAC_KEYS: [&str; 10] = [
    "course_id",
    "email",
    "name",
    "enrollment_action",
    "country",
    "level_of_education",
    "gender",
    "year_of_birth",
    "lang",
    "time",
];

/// Message shown to the user for any signature failure
pub const SIGNATURE_FAILED_MESSAGE: &str =
    "The security check has failed on the provided parameters";

// ── Request ───────────────────────────────────────────────

/// Raw inbound request fields, by name
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SignedRequest {
    fields: BTreeMap<String, String>,
}

impl SignedRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// The field value, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// The field value, or `""` when absent
    pub fn value(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.fields.remove(key)
    }

    /// The remote signature, ignoring an empty value
    pub fn signature(&self) -> Option<&str> {
        self.get(SIGNATURE_FIELD).filter(|s| !s.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SignedRequest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ── Signing ───────────────────────────────────────────────

/// Build the canonical message that is signed
pub fn canonical_message(request: &SignedRequest) -> String {
    ORDERED_HMAC_KEYS
        .iter()
        .map(|key| format!("{}={}", key, request.value(key)))
        .collect::<Vec<_>>()
        .join(";")
}

fn keyed_mac(secret: &[u8], message: &str) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| Error::ConfigError(format!("invalid HMAC key: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(mac)
}

/// Compute the hex signature for a request
pub fn sign(request: &SignedRequest, secret: &[u8]) -> Result<String> {
    let mac = keyed_mac(secret, &canonical_message(request))?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Return the request with `forus_hmac` set to its signature
pub fn sign_request(mut request: SignedRequest, secret: &[u8]) -> Result<SignedRequest> {
    let signature = sign(&request, secret)?;
    request.set(SIGNATURE_FIELD, signature);
    Ok(request)
}

// ── Verification ──────────────────────────────────────────

/// Check `forus_hmac` against the locally computed signature.
///
/// The remote value must be lowercase hex; comparison is constant time.
///
/// # Errors
/// Returns `SignatureError` when the signature is missing or wrong.
pub fn verify_signature(request: &SignedRequest, secret: &[u8]) -> Result<()> {
    let Some(remote) = request.signature() else {
        tracing::warn!(email = request.value("email"), "HMAC is missing");
        return Err(Error::SignatureError(SIGNATURE_FAILED_MESSAGE.to_string()));
    };

    let message = canonical_message(request);
    let mac = keyed_mac(secret, &message)?;

    let matches = is_lowercase_hex(remote)
        && hex::decode(remote)
            .map(|bytes| mac.verify_slice(&bytes).is_ok())
            .unwrap_or(false);

    if !matches {
        tracing::warn!(remote, msg_to_hash = %message, "HMAC is not correct");
        return Err(Error::SignatureError(SIGNATURE_FAILED_MESSAGE.to_string()));
    }

    Ok(())
}

fn is_lowercase_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
