//! Signed QR token codec.
//!
//! The wire form is base64 of a compact JSON object with short keys
//! `{s, t, n, h}` (and `e`): session id, issued-at unix seconds, random
//! nonce, and a truncated keyed digest over the concatenation of `s`, `t`
//! and `n`. Short keys and a truncated digest keep the rendered QR code
//! sparse enough to scan from a projector.
//!
//! `decode` is the only function on the untrusted path: the token arrives
//! from a photographed QR code and must be treated as hostile. Freshness is
//! always recomputed from the embedded `t`; the declared `e` field is
//! attacker-visible and never trusted.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::AttendanceError;

type HmacSha256 = Hmac<Sha256>;

/// Hex characters kept from the HMAC output.
const DIGEST_HEX_LEN: usize = 16;
const NONCE_BYTES: usize = 8;

/// Decoded contents of a scanned token. Field names are the wire keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrTokenPayload {
    /// Session id.
    pub s: i64,
    /// Issued-at, unix seconds.
    pub t: i64,
    /// Random nonce, hex.
    pub n: String,
    /// Truncated keyed digest over `s + t + n`.
    pub h: String,
    /// Declared expiry, unix seconds. Written for wire compatibility,
    /// ignored on decode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<i64>,
}

/// The result of one QR issuance cycle.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    /// The raw token string embedded in the QR image.
    pub token: String,
    /// SVG rendering of the token as a `data:` URI, high error correction.
    pub qr_svg: String,
    pub expires_at: DateTime<Utc>,
}

fn digest(secret: &str, s: i64, t: i64, n: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC key");
    mac.update(format!("{s}{t}{n}").as_bytes());
    let bytes = mac.finalize().into_bytes();
    let mut hexed = hex::encode(bytes);
    hexed.truncate(DIGEST_HEX_LEN);
    hexed
}

/// Builds and signs a fresh token for `session_id` and renders it as a QR
/// image. Two calls never produce the same token (random nonce). Payload
/// construction cannot fail; only image rendering can.
pub fn encode(
    session_id: i64,
    secret: &str,
    now: DateTime<Utc>,
    validity_secs: i64,
) -> Result<IssuedToken, AttendanceError> {
    use rand::RngCore;
    let mut buf = [0u8; NONCE_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    let nonce = hex::encode(buf);

    let issued_at = now.timestamp();
    let payload = QrTokenPayload {
        s: session_id,
        t: issued_at,
        n: nonce.clone(),
        h: digest(secret, session_id, issued_at, &nonce),
        e: Some(issued_at + validity_secs),
    };

    let json = serde_json::to_string(&payload)
        .map_err(|e| AttendanceError::EncodingFailure(e.to_string()))?;
    let token = BASE64.encode(json);

    let code = QrCode::with_error_correction_level(token.as_bytes(), EcLevel::H)
        .map_err(|e| AttendanceError::EncodingFailure(e.to_string()))?;
    let image = code
        .render::<svg::Color>()
        .min_dimensions(256, 256)
        .build();
    let qr_svg = format!("data:image/svg+xml;base64,{}", BASE64.encode(image));

    Ok(IssuedToken {
        token,
        qr_svg,
        expires_at: now + Duration::seconds(validity_secs),
    })
}

/// Parses and verifies a scanned token.
///
/// Fails with `MalformedToken` on base64/JSON/missing-field errors,
/// `IntegrityFailure` on a digest mismatch, and `ExpiredToken` once
/// `now - t` exceeds the freshness window.
pub fn decode(
    token: &str,
    secret: &str,
    now: DateTime<Utc>,
    freshness_secs: i64,
) -> Result<QrTokenPayload, AttendanceError> {
    let bytes = BASE64
        .decode(token.trim())
        .map_err(|_| AttendanceError::MalformedToken)?;
    let payload: QrTokenPayload =
        serde_json::from_slice(&bytes).map_err(|_| AttendanceError::MalformedToken)?;

    let expected = digest(secret, payload.s, payload.t, &payload.n);
    if expected != payload.h {
        return Err(AttendanceError::IntegrityFailure);
    }

    if now.timestamp() - payload.t > freshness_secs {
        return Err(AttendanceError::ExpiredToken);
    }

    Ok(payload)
}
