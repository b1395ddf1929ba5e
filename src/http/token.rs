//! Bearer token inspection.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use serde_json::Value;

/// Returns true if the token's `exp` claim lies in the past.
///
/// Anything that cannot be read as a three-segment token with a JSON payload
/// and a numeric `exp` counts as expired. That includes tokens with no `exp`
/// claim at all, which the web client treated as never expiring.
pub fn is_token_expired(token: &str) -> bool {
    is_token_expired_at(token, Utc::now().timestamp_millis())
}

pub fn is_token_expired_at(token: &str, now_millis: i64) -> bool {
    match expiry_millis(token) {
        Some(exp_millis) => exp_millis < now_millis as f64,
        None => true,
    }
}

/// Reads the `exp` claim of a token, in milliseconds since the epoch.
pub fn expiry_millis(token: &str) -> Option<f64> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return None;
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp").and_then(Value::as_f64)?;
    Some(exp * 1000.0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds an unsigned token carrying the given claims.
    pub(crate) fn make_token(claims: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{}.{}.signature", header, payload)
    }

    pub(crate) fn token_expiring_in(seconds: i64) -> String {
        let exp = Utc::now().timestamp() + seconds;
        make_token(&serde_json::json!({ "sub": "42", "exp": exp }))
    }

    #[test]
    fn test_past_exp_is_expired() {
        assert!(is_token_expired(&token_expiring_in(-60)));
        assert!(is_token_expired(&token_expiring_in(-86_400 * 365)));
    }

    #[test]
    fn test_future_exp_is_not_expired() {
        assert!(!is_token_expired(&token_expiring_in(60)));
        assert!(!is_token_expired(&token_expiring_in(86_400)));
    }

    #[test]
    fn test_boundary_uses_milliseconds() {
        let token = make_token(&serde_json::json!({ "exp": 1_700_000_000 }));
        assert!(!is_token_expired_at(&token, 1_700_000_000_000));
        assert!(is_token_expired_at(&token, 1_700_000_000_001));
    }

    #[test]
    fn test_wrong_segment_count_is_expired() {
        assert!(is_token_expired(""));
        assert!(is_token_expired("abc"));
        assert!(is_token_expired("a.b"));
        assert!(is_token_expired("a.b.c.d"));
    }

    #[test]
    fn test_non_base64_payload_is_expired() {
        assert!(is_token_expired("header.!!!not-base64!!!.sig"));
    }

    #[test]
    fn test_non_json_payload_is_expired() {
        let payload = URL_SAFE_NO_PAD.encode("not json");
        assert!(is_token_expired(&format!("h.{}.s", payload)));
    }

    #[test]
    fn test_missing_or_non_numeric_exp_is_expired() {
        assert!(is_token_expired(&make_token(&serde_json::json!({ "sub": "1" }))));
        assert!(is_token_expired(&make_token(
            &serde_json::json!({ "exp": "tomorrow" })
        )));
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let exp = Utc::now().timestamp() + 3600;
        let payload = base64::engine::general_purpose::URL_SAFE
            .encode(serde_json::json!({ "exp": exp }).to_string());
        assert!(!is_token_expired(&format!("h.{}.s", payload)));
    }
}
