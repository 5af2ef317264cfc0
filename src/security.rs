use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex HMAC-SHA256 the gateway attaches to a request
///
/// The signed message is the decimal timestamp followed by the raw body.
pub fn sign(timestamp: &str, body: &[u8], secret: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(timestamp.as_bytes());
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Verify HMAC-SHA256 signature
///
/// Proves the interaction was forwarded by the bot gateway holding the
/// shared secret and not by an arbitrary HTTP client.
///
/// # Arguments
/// * `timestamp` - The signed timestamp header, as sent
/// * `body` - The raw request body
/// * `signature` - The hex-encoded HMAC signature
/// * `secret` - The shared secret key (from environment)
pub fn verify_hmac(timestamp: &str, body: &[u8], signature: &str, secret: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return false;
        }
    };

    mac.update(timestamp.as_bytes());
    mac.update(body);

    let sig_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid hex signature format");
            return false;
        }
    };

    // Constant-time comparison
    mac.verify_slice(&sig_bytes).is_ok()
}

/// Validate timestamp is within acceptable range
///
/// Prevents replay attacks by ensuring the request is recent.
///
/// # Arguments
/// * `timestamp` - Unix timestamp in seconds from the gateway
/// * `max_age_secs` - Maximum age allowed in seconds
pub fn validate_timestamp(timestamp: i64, max_age_secs: i64) -> bool {
    let now = chrono::Utc::now().timestamp();
    let age_seconds = (now - timestamp).abs();

    if age_seconds > max_age_secs {
        tracing::warn!(
            "Timestamp too old: {} seconds (max: {})",
            age_seconds,
            max_age_secs
        );
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key";

    #[test]
    fn test_verify_hmac_valid() {
        let body = br#"{"command":{"name":"balance"}}"#;
        let signature = sign("1700000000", body, SECRET).unwrap();

        assert_eq!(signature.len(), 64);
        assert!(verify_hmac("1700000000", body, &signature, SECRET));
    }

    #[test]
    fn test_verify_hmac_invalid_signature() {
        let wrong_signature = "0".repeat(64);
        assert!(!verify_hmac("1700000000", b"body", &wrong_signature, SECRET));
        assert!(!verify_hmac("1700000000", b"body", "not-hex", SECRET));
    }

    #[test]
    fn test_verify_hmac_wrong_secret() {
        let signature = sign("1700000000", b"body", SECRET).unwrap();
        assert!(!verify_hmac("1700000000", b"body", &signature, "wrong-secret"));
    }

    #[test]
    fn test_verify_hmac_covers_timestamp() {
        let signature = sign("1700000000", b"body", SECRET).unwrap();
        assert!(!verify_hmac("1700000001", b"body", &signature, SECRET));
        assert!(!verify_hmac("1700000000", b"body!", &signature, SECRET));
    }

    #[test]
    fn test_validate_timestamp_valid() {
        let now = chrono::Utc::now().timestamp();
        assert!(validate_timestamp(now, 300));
        assert!(validate_timestamp(now - 100, 300));
        assert!(validate_timestamp(now + 100, 300));
    }

    #[test]
    fn test_validate_timestamp_too_old() {
        let old = chrono::Utc::now().timestamp() - 400;
        assert!(!validate_timestamp(old, 300));
    }

    #[test]
    fn test_validate_timestamp_too_future() {
        let future = chrono::Utc::now().timestamp() + 400;
        assert!(!validate_timestamp(future, 300));
    }
}
