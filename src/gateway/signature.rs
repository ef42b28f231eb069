//! HMAC-SHA256 signature checks for gateway payloads.
//!
//! Two payload forms exist: client-reported payments sign
//! `"{order_id}|{payment_id}"` with the API key secret, webhooks sign the
//! raw request body with the webhook secret. Both are hex-encoded.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn hmac_sha256_hex(secret: &str, payload: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Expected signature for a client-reported payment.
pub fn payment_signature(key_secret: &str, order_id: &str, payment_id: &str) -> Option<String> {
    let message = format!("{}|{}", order_id, payment_id);
    hmac_sha256_hex(key_secret, message.as_bytes())
}

/// Verify a client-reported payment signature.
pub fn verify_payment_signature(
    key_secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    match payment_signature(key_secret, order_id, payment_id) {
        Some(expected) => secure_eq(expected.as_bytes(), signature.trim().as_bytes()),
        None => false,
    }
}

/// Verify a webhook signature over the raw request body.
pub fn verify_webhook_signature(webhook_secret: &str, body: &[u8], signature: &str) -> bool {
    match hmac_sha256_hex(webhook_secret, body) {
        Some(expected) => secure_eq(expected.as_bytes(), signature.trim().as_bytes()),
        None => false,
    }
}

/// Constant-time byte comparison.
pub fn secure_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0_u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
