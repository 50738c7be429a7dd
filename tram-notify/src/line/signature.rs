//! Webhook signature verification.
//!
//! LINE signs every webhook body with HMAC-SHA256 keyed by the channel
//! secret and sends the base64 digest in `x-line-signature`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Base64 HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Check `signature` against `body`. The digest comparison is constant time.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify() {
        let body = br#"{"events":[]}"#;
        let signature = sign("channel-secret", body);
        assert!(verify_signature("channel-secret", body, &signature));
    }

    #[test]
    fn wrong_secret_or_body_fails() {
        let body = br#"{"events":[]}"#;
        let signature = sign("channel-secret", body);
        assert!(!verify_signature("other-secret", body, &signature));
        assert!(!verify_signature("channel-secret", br#"{"events":[1]}"#, &signature));
    }

    #[test]
    fn garbage_signature_fails() {
        assert!(!verify_signature("s", b"body", "not base64!!"));
        assert!(!verify_signature("s", b"body", ""));
    }

    #[test]
    fn known_digest() {
        // echo -n 'hello' | openssl dgst -sha256 -hmac key -binary | base64
        assert_eq!(
            sign("key", b"hello"),
            "kwezuRXvtRcf8U2MtV+8x5jGwO8UVtZt7RpqpyOli3s="
        );
    }
}
