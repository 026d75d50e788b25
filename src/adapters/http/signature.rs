//! Request signing for the inbound webhook.
//!
//! Gateways sign the raw request body with HMAC-SHA256 over a shared secret
//! and send it as `X-Flow-Signature: sha256=<hex>`.
//!
//! Operator requests address a single conversation through the path and may
//! carry no body, so they sign [`operator_payload`]: the request path, a
//! newline, then the raw body.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-flow-signature";

const SCHEME_PREFIX: &str = "sha256=";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Missing {SIGNATURE_HEADER} header")]
    Missing,

    #[error("Malformed signature header")]
    Malformed,

    #[error("Signature does not match request body")]
    Mismatch,
}

/// Header value for `body` signed with `secret`.
pub fn sign(secret: &[u8], body: &[u8]) -> Result<String, SignatureError> {
    Ok(format!("{}{}", SCHEME_PREFIX, hex_encode(&digest(secret, body)?)))
}

/// Bytes an operator request is signed over.
pub fn operator_payload(path: &str, body: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(path.len() + 1 + body.len());
    payload.extend_from_slice(path.as_bytes());
    payload.push(b'\n');
    payload.extend_from_slice(body);
    payload
}

/// Checks a signature header against the raw body in constant time.
pub fn verify_signature(
    secret: &[u8],
    body: &[u8],
    header: Option<&str>,
) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::Missing)?;
    let provided = header
        .trim()
        .strip_prefix(SCHEME_PREFIX)
        .ok_or(SignatureError::Malformed)?
        .to_ascii_lowercase();

    let expected = hex_encode(&digest(secret, body)?);
    if expected.as_bytes().ct_eq(provided.as_bytes()).unwrap_u8() != 1 {
        tracing::warn!("Invalid request signature");
        return Err(SignatureError::Mismatch);
    }
    Ok(())
}

fn digest(secret: &[u8], body: &[u8]) -> Result<Vec<u8>, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::Malformed)?;
    mac.update(body);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
