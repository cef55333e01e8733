//! Bearer-token inspection.
//!
//! Tokens are JWT-shaped: `header.payload.signature`, each segment
//! base64-encoded. The client never verifies the signature (that's the
//! backend's job). It only reads `exp` out of the payload so an expired
//! token is caught before a request is wasted on it.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::ValidationError;

/// Decodes the expiry embedded in a token, in epoch milliseconds.
///
/// The payload may be base64url or standard base64, padded or not.
///
/// # Errors
/// [`ValidationError::InvalidToken`] if the token doesn't have three
/// segments, the payload isn't base64 JSON, or `exp` is missing or not a
/// number.
pub fn decode_token_expiry(token: &str) -> Result<i64, ValidationError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(ValidationError::invalid(format!(
            "expected 3 token segments, found {}",
            segments.len()
        )));
    }

    // Fold standard base64 onto the url-safe alphabet so one engine reads both.
    let payload: String = segments[1]
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.as_bytes())
        .map_err(|e| ValidationError::invalid(format!("payload is not base64: {e}")))?;

    let claims: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| ValidationError::invalid(format!("payload is not JSON: {e}")))?;

    let exp = claims
        .get("exp")
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| ValidationError::invalid("payload has no numeric exp"))?;

    Ok((exp * 1000.0) as i64)
}

/// Builds an unsigned JWT-shaped token carrying `sub` and `exp`.
///
/// Only for development and tests: the signature segment is a fixed
/// placeholder, so no backend will accept it.
pub fn unsigned_token(subject: &str, exp_secs: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let claims = serde_json::json!({ "sub": subject, "exp": exp_secs });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{header}.{payload}.unsigned")
}
