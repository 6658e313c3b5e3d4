use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use chrono::{DateTime, Duration, TimeZone, Utc};

use uuid::Uuid;

use base64::{
    alphabet,
    engine::{self, general_purpose},
    Engine as _,
};

use super::SigningKey;

lazy_static::lazy_static! {
    // Base64 serialization engine
    static ref BASE64_ENGINE: engine::GeneralPurpose =
        engine::GeneralPurpose::new(&alphabet::URL_SAFE, general_purpose::NO_PAD);
}

/// Various errors that can occur when handling tokens
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token signature does not match")]
    SignatureMismatch,
    #[error("Token is expired")]
    Expired,
    #[error("Failed to decode or encode token")]
    DecodeEncodeError,
}

impl From<std::str::Utf8Error> for TokenError {
    fn from(_e: std::str::Utf8Error) -> Self {
        Self::DecodeEncodeError
    }
}

impl From<serde_json::Error> for TokenError {
    fn from(_e: serde_json::Error) -> Self {
        Self::DecodeEncodeError
    }
}

impl From<base64::DecodeError> for TokenError {
    fn from(_e: base64::DecodeError) -> Self {
        Self::DecodeEncodeError
    }
}

/// Wrapper for token results
pub type TokenResult<T> = Result<T, TokenError>;

/// The role a session token grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Coach,
    Subscriber,
}

/// Identity and role bound into a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Ledger id of the subscriber; `None` for the coach, who has no
    /// ledger record
    pub subject: Option<Uuid>,
    pub email: String,
    pub role: Role,
}

impl Claims {
    pub fn coach(email: impl Into<String>) -> Self {
        Self {
            subject: None,
            email: email.into(),
            role: Role::Coach,
        }
    }

    pub fn subscriber(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            subject: Some(id),
            email: email.into(),
            role: Role::Subscriber,
        }
    }
}

/// A signed, time-bounded session token.
///
/// Wire format is `base64url(message).base64url(signature)` where the
/// message is the JSON-encoded claims plus expiry, and the signature is an
/// HMAC-SHA256 over the message bytes. The expiry is embedded so validation
/// needs no store lookup; callers still confirm the subject exists and is
/// not blocked.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Sign the claims into a token expiring after `ttl`
    pub fn issue(key: &SigningKey, claims: Claims, ttl: Duration) -> TokenResult<Self> {
        Self::issue_at(key, claims, Utc::now() + ttl)
    }

    /// Sign the claims into a token expiring at an absolute instant
    pub fn issue_at(key: &SigningKey, claims: Claims, expires_at: DateTime<Utc>) -> TokenResult<Self> {
        let message = TokenMessage {
            exp: expires_at.timestamp(),
            claims,
        };
        let msg = serde_json::to_string(&message)?;
        let sig = key.sign(msg.as_bytes());

        let msg = BASE64_ENGINE.encode(msg);
        let sig = BASE64_ENGINE.encode(sig);

        Ok(Self(format!("{}.{}", msg, sig)))
    }

    /// Verify the token signature and expiry, returning the bound claims
    pub fn validate(&self, key: &SigningKey) -> TokenResult<Claims> {
        let (msg, sig) = self.split().ok_or(TokenError::DecodeEncodeError)?;
        let msg = BASE64_ENGINE.decode(msg)?;
        let sig = BASE64_ENGINE.decode(sig)?;

        if !key.matches(&msg, &sig) {
            return Err(TokenError::SignatureMismatch);
        }

        let msg = std::str::from_utf8(&msg)?;
        let message: TokenMessage = serde_json::from_str(msg)?;
        if message.is_expired(Utc::now()) {
            return Err(TokenError::Expired);
        }
        Ok(message.claims)
    }

    fn split(&self) -> Option<(&str, &str)> {
        let mut matches = self.0.splitn(2, '.');
        let msg = matches.next()?;
        let sig = matches.next()?;
        Some((msg, sig))
    }
}

impl AsRef<str> for AccessToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AccessToken {
    type Err = TokenError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Ok(Self(token.to_string()))
    }
}

/// Serializable envelope: expiry timestamp plus the claims
#[derive(Debug, Serialize, Deserialize)]
struct TokenMessage {
    exp: i64,
    claims: Claims,
}

impl TokenMessage {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        // NOTE: Default to the earliest date in ambiguous instances for security reasons
        Utc.timestamp_opt(self.exp, 0u32)
            .earliest()
            // Consider the token expired if the timestamp is invalid
            .map_or(true, |exp| now > exp)
    }
}
