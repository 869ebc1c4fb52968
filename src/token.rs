use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("no verification token was provided")]
    Missing,
    #[error("malformed verification token: {0}")]
    Malformed(String),
}

pub type TokenResult<T> = Result<T, TokenError>;

/// Claims carried in the payload segment of a verification token.
///
/// Wire field names match what the bot issues (`UUID`, `user_id`, `exp`,
/// `iat`). The token's own signature is never checked here; the backend
/// re-verifies everything, so these claims are routing hints only and
/// must not be treated as authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "UUID")]
    pub subject_uuid: String,
    #[serde(rename = "user_id")]
    pub account_id: i64,
    #[serde(rename = "exp")]
    pub expires_at: i64,
    #[serde(rename = "iat", skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,
}

impl TokenClaims {
    /// Expiry is in epoch seconds; a token expiring exactly now is still valid.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now.timestamp()
    }

    pub fn expires_at_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }

    /// Time left before expiry, clamped to zero.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        let secs = (self.expires_at - now.timestamp()).max(0);
        Duration::seconds(secs)
    }
}

/// Parses a three-segment verification token and validates its claims.
///
/// Any structural problem is `Malformed` with a field-specific detail;
/// expiry is a separate check (`TokenClaims::is_expired`) so that expired
/// and malformed tokens stay distinct error categories.
pub fn parse(raw: &str) -> TokenResult<TokenClaims> {
    let segments: Vec<&str> = raw.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Malformed(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    let payload = decode_segment(segments[1])
        .ok_or_else(|| TokenError::Malformed("payload is not valid base64".to_string()))?;
    let value: Value = serde_json::from_slice(&payload)
        .map_err(|_| TokenError::Malformed("payload is not valid JSON".to_string()))?;

    let subject_uuid = value
        .get("UUID")
        .and_then(Value::as_str)
        .ok_or_else(|| TokenError::Malformed("missing or invalid UUID".to_string()))?;
    if !is_canonical_uuid(subject_uuid) {
        return Err(TokenError::Malformed(
            "UUID is not in canonical form".to_string(),
        ));
    }

    let account_id = value
        .get("user_id")
        .and_then(Value::as_i64)
        .filter(|id| *id > 0)
        .ok_or_else(|| TokenError::Malformed("missing or invalid user id".to_string()))?;

    let expires_at = value
        .get("exp")
        .and_then(Value::as_i64)
        .ok_or_else(|| TokenError::Malformed("missing or invalid expiration".to_string()))?;

    let issued_at = value.get("iat").and_then(Value::as_i64);

    Ok(TokenClaims {
        subject_uuid: subject_uuid.to_string(),
        account_id,
        expires_at,
        issued_at,
    })
}

/// Structural check only: three segments with decodable header and payload.
pub fn is_valid_format(raw: &str) -> bool {
    let segments: Vec<&str> = raw.split('.').collect();
    if segments.len() != 3 {
        return false;
    }
    segments[..2].iter().all(|segment| {
        decode_segment(segment)
            .map(|bytes| serde_json::from_slice::<Value>(&bytes).is_ok())
            .unwrap_or(false)
    })
}

/// Human-readable countdown, e.g. "5m 30s".
pub fn format_time_remaining(remaining: Duration) -> String {
    let seconds = remaining.num_seconds();
    if seconds <= 0 {
        return "Expired".to_string();
    }

    let minutes = seconds / 60;
    let leftover = seconds % 60;
    if minutes > 0 {
        format!("{}m {}s", minutes, leftover)
    } else {
        format!("{}s", leftover)
    }
}

// Tokens are minted url-safe without padding, but tolerate standard
// alphabets the way browser atob-based decoders did.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    general_purpose::URL_SAFE_NO_PAD
        .decode(segment)
        .ok()
        .or_else(|| general_purpose::STANDARD.decode(segment).ok())
}

// Hyphenated 8-4-4-4-12 form only; Uuid::parse_str alone would also
// accept the simple and urn forms.
fn is_canonical_uuid(candidate: &str) -> bool {
    candidate.len() == 36 && Uuid::parse_str(candidate).is_ok()
}
