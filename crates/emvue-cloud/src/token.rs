//! Structural access-token decoding.
//!
//! The access token is a three-segment, dot-separated, base64url-encoded
//! structure. Only the middle (payload) segment is decoded, and only to
//! read the `exp` claim; the signature is deliberately not verified — the
//! server is the authority on token validity.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::time::{SystemTime, UNIX_EPOCH};

use emvue_core::error::AuthError;
use emvue_core::Result;

/// Decode the `exp` claim (epoch seconds) from an access token.
pub fn decode_expiry(token: &str) -> Result<i64> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) => payload,
        _ => {
            return Err(AuthError::MalformedToken {
                reason: "expected three dot-separated segments".to_string(),
            }
            .into());
        }
    };

    // Some encoders pad; the alphabet itself is always url-safe.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|err| AuthError::MalformedToken {
            reason: format!("payload is not base64url: {err}"),
        })?;

    let claims: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|err| AuthError::MalformedToken {
            reason: format!("payload is not JSON: {err}"),
        })?;

    claims
        .get("exp")
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| {
            AuthError::MalformedToken {
                reason: "payload has no exp claim".to_string(),
            }
            .into()
        })
}

/// Current wall-clock time in epoch seconds.
pub fn epoch_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}
