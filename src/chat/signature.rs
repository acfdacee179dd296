//! LINE webhook signature verification.
//!
//! LINE signs each webhook body with HMAC-SHA256 keyed by the channel secret
//! and sends the base64 digest in `X-Line-Signature`.

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::logging::structured::LogContext;

type HmacSha256 = Hmac<Sha256>;

/// Signature verification result.
#[derive(Debug, PartialEq, Eq)]
pub struct SignatureVerificationResult {
    pub verified: bool,
    pub error: Option<String>,
}

impl SignatureVerificationResult {
    pub fn verified() -> Self {
        Self {
            verified: true,
            error: None,
        }
    }

    pub fn invalid(error: &str) -> Self {
        Self {
            verified: false,
            error: Some(error.to_string()),
        }
    }
}

/// Base64 HMAC-SHA256 of `body`, as LINE would send it.
pub fn compute_signature(channel_secret: &str, body: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes()).ok()?;
    mac.update(body.as_bytes());
    Some(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Verify an `X-Line-Signature` header against the raw body.
///
/// The digest comparison is constant-time.
pub fn verify_webhook_signature(
    channel_secret: &str,
    body: &str,
    signature_base64: &str,
    ctx: &LogContext,
) -> SignatureVerificationResult {
    let signature_bytes = match general_purpose::STANDARD.decode(signature_base64.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("{} WEBHOOK_SIGNATURE_DECODE_FAILED error={}", ctx, e);
            return SignatureVerificationResult::invalid(&format!("Decode error: {}", e));
        }
    };

    let mut mac = match HmacSha256::new_from_slice(channel_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            log::error!("{} WEBHOOK_SIGNATURE_KEY_INVALID error={}", ctx, e);
            return SignatureVerificationResult::invalid(&format!("Key error: {}", e));
        }
    };
    mac.update(body.as_bytes());

    match mac.verify_slice(&signature_bytes) {
        Ok(()) => {
            log::debug!("{} WEBHOOK_SIGNATURE_VERIFY valid=true", ctx);
            SignatureVerificationResult::verified()
        }
        Err(e) => {
            log::warn!("{} WEBHOOK_SIGNATURE_INVALID error={}", ctx, e);
            SignatureVerificationResult::invalid(&format!("Verification failed: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "channel-secret";
    const BODY: &str = r#"{"events":[]}"#;

    #[test]
    fn test_round_trip_signature_verifies() {
        let ctx = LogContext::new("test-req");
        let signature = compute_signature(SECRET, BODY).unwrap();
        assert_eq!(
            verify_webhook_signature(SECRET, BODY, &signature, &ctx),
            SignatureVerificationResult::verified()
        );
    }

    #[test]
    fn test_tampered_body_fails() {
        let ctx = LogContext::new("test-req");
        let signature = compute_signature(SECRET, BODY).unwrap();
        let result = verify_webhook_signature(SECRET, r#"{"events":[{}]}"#, &signature, &ctx);
        assert!(!result.verified);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_wrong_secret_fails() {
        let ctx = LogContext::new("test-req");
        let signature = compute_signature("other-secret", BODY).unwrap();
        assert!(!verify_webhook_signature(SECRET, BODY, &signature, &ctx).verified);
    }

    #[test]
    fn test_garbage_signature_fails() {
        let ctx = LogContext::new("test-req");
        let result = verify_webhook_signature(SECRET, BODY, "not base64!!", &ctx);
        assert!(!result.verified);
        assert!(result.error.unwrap().starts_with("Decode error"));
    }
}
