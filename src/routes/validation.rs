use axum::http::HeaderMap;
use serde::de::DeserializeOwned;

use crate::constants::{
    ERR_INVALID_TIMESTAMP, MAX_TIMESTAMP_AGE_SECS, SIGNATURE_HEADER, SIGNATURE_TIMESTAMP_HEADER,
};
use crate::error::AppError;
use crate::security::{validate_timestamp, verify_hmac};

/// Error type for signed request validation (constrained to only possible errors)
#[derive(Debug)]
pub enum SignedRequestError {
    InvalidSignature,
    InvalidTimestamp,
}

impl From<SignedRequestError> for AppError {
    fn from(err: SignedRequestError) -> Self {
        match err {
            SignedRequestError::InvalidSignature => AppError::InvalidSignature,
            SignedRequestError::InvalidTimestamp => {
                AppError::InvalidInput(ERR_INVALID_TIMESTAMP.to_string())
            }
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Verify the gateway's HMAC signature and timestamp headers over `body`
pub fn validate_signed_request(
    headers: &HeaderMap,
    body: &[u8],
    secret: &str,
) -> Result<(), SignedRequestError> {
    let (Some(timestamp), Some(signature)) = (
        header(headers, SIGNATURE_TIMESTAMP_HEADER),
        header(headers, SIGNATURE_HEADER),
    ) else {
        tracing::warn!("Unsigned request rejected");
        return Err(SignedRequestError::InvalidSignature);
    };

    if !verify_hmac(timestamp, body, signature, secret) {
        tracing::warn!("Invalid HMAC signature");
        return Err(SignedRequestError::InvalidSignature);
    }

    let Ok(seconds) = timestamp.trim().parse::<i64>() else {
        return Err(SignedRequestError::InvalidTimestamp);
    };
    if !validate_timestamp(seconds, MAX_TIMESTAMP_AGE_SECS) {
        return Err(SignedRequestError::InvalidTimestamp);
    }

    Ok(())
}

/// Check the signature, then decode the JSON body
pub fn decode_signed<T: DeserializeOwned>(
    headers: &HeaderMap,
    body: &[u8],
    secret: &str,
) -> Result<T, AppError> {
    validate_signed_request(headers, body, secret)?;
    serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid request body: {}", e)))
}
