//! HMAC-SHA256 verification of inbound webhook deliveries.
//!
//! DealHub signs the raw request body with the subscription secret and sends
//! the hex digest in the `X-DealHub-Signature` header, optionally prefixed
//! with `sha256=`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "x-dealhub-signature";

const PREFIX: &str = "sha256=";

/// Returns `true` only if `signature` is the HMAC-SHA256 of `payload` under
/// `secret`.
///
/// Comparison is constant-time. Malformed input (bad hex, wrong length)
/// yields `false`; this function never panics.
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    let provided = signature.strip_prefix(PREFIX).unwrap_or(signature);

    let Ok(provided) = hex::decode(provided) else {
        return false;
    };
    let Some(mac) = keyed(payload, secret) else {
        return false;
    };
    mac.verify_slice(&provided).is_ok()
}

/// `sha256=<hex digest>` for `payload` under `secret`, or `None` if the
/// secret cannot key the MAC. HMAC accepts keys of any length, so in
/// practice this is always `Some`.
pub fn sign_payload(payload: &[u8], secret: &str) -> Option<String> {
    let mac = keyed(payload, secret)?;
    Some(format!("{PREFIX}{}", hex::encode(mac.finalize().into_bytes())))
}

fn keyed(payload: &[u8], secret: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload);
    Some(mac)
}
