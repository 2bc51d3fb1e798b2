//! Admin credential check.
//!
//! A credential is `base64("<secret>:<issued_at_millis>")`. It is a pure
//! function of the secret and the issue time, so nothing is stored on the
//! server and any instance can verify a credential issued by another.
//!
//! The timestamp is only enforced when a TTL is configured.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use thiserror::Error;

/// Errors returned when issuing a credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The submitted secret does not match the configured one.
    #[error("Invalid password")]
    InvalidSecret,
}

/// Contents of a decoded credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCredential {
    pub secret: String,
    /// `None` when the timestamp part is absent or unparsable.
    pub issued_at: Option<DateTime<Utc>>,
}

/// Issues and verifies bearer credentials against the admin secret.
#[derive(Clone)]
pub struct Credentials {
    secret: String,
    ttl: Option<Duration>,
}

impl Credentials {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl: None,
        }
    }

    /// Rejects credentials older than `ttl` during verification.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Checks `secret` and issues a credential stamped with the current time.
    pub fn authenticate(&self, secret: &str) -> Result<String, AuthError> {
        self.authenticate_at(secret, Utc::now())
    }

    /// Checks `secret` and issues a credential stamped with `issued_at`.
    pub fn authenticate_at(
        &self,
        secret: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        if secret.as_bytes() != self.secret.as_bytes() {
            return Err(AuthError::InvalidSecret);
        }
        Ok(encode_credential(secret, issued_at))
    }

    /// Returns true if the credential embeds the configured secret.
    pub fn verify(&self, credential: &str) -> bool {
        self.verify_at(credential, Utc::now())
    }

    /// Like [`verify`](Self::verify), evaluating expiry at `now`.
    pub fn verify_at(&self, credential: &str, now: DateTime<Utc>) -> bool {
        let Some(decoded) = decode_credential(credential) else {
            return false;
        };

        if decoded.secret.as_bytes() != self.secret.as_bytes() {
            return false;
        }

        match (self.ttl, decoded.issued_at) {
            (None, _) => true,
            (Some(ttl), Some(issued_at)) => now.signed_duration_since(issued_at) <= ttl,
            (Some(_), None) => false,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Builds the wire form of a credential.
pub fn encode_credential(secret: &str, issued_at: DateTime<Utc>) -> String {
    STANDARD.encode(format!("{}:{}", secret, issued_at.timestamp_millis()))
}

/// Decodes a credential. Returns `None` if it is not base64 of UTF-8 text.
///
/// The timestamp is taken from after the last `:` so secrets containing
/// colons still decode intact.
pub fn decode_credential(credential: &str) -> Option<DecodedCredential> {
    let bytes = STANDARD.decode(credential.trim()).ok()?;
    let text = String::from_utf8(bytes).ok()?;

    let decoded = match text.rsplit_once(':') {
        Some((secret, millis)) => DecodedCredential {
            secret: secret.to_string(),
            issued_at: millis
                .parse::<i64>()
                .ok()
                .and_then(DateTime::from_timestamp_millis),
        },
        None => DecodedCredential {
            secret: text,
            issued_at: None,
        },
    };
    Some(decoded)
}
