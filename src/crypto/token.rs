use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, TimeZone, Utc};
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::models::claim::SessionClaim;

/// The size of the signing secret in bytes.
pub const SECRET_SIZE: usize = 32;
/// The size of the integrity tag in bytes.
pub const TAG_SIZE: usize = 32;
/// Version byte prefixed to every encoded claim.
const CLAIM_VERSION: u8 = 1;
/// Maximum length of a claim string field (class id, issuer id).
const MAX_FIELD_LEN: usize = 256;

/// Errors produced when verifying a signed session token.
///
/// Expiry is reported with its own discriminator so callers can tell a
/// legitimately lapsed token apart from forged input, but that distinction
/// is only trusted after the integrity tag has been validated.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// The string cannot be decoded into a claim shape.
    #[error("token cannot be decoded")]
    Malformed,
    /// The integrity tag does not match the recomputed tag.
    #[error("token integrity check failed")]
    Tampered,
    /// The claim's validity window has lapsed.
    #[error("token has expired")]
    Expired,
}

/// Encodes session claims into signed, tamper-evident compact strings and
/// decodes them back.
///
/// Wire format: `base64url(claim bytes) "." base64url(tag)` where the tag is
/// a keyed BLAKE3 hash of the claim bytes under a server-held secret. The
/// URL-safe alphabet keeps the token safe for 2D-barcode transport. The
/// codec is pure: it holds no state beyond the secret.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Zeroizing<[u8; SECRET_SIZE]>,
}

impl TokenCodec {
    /// Creates a codec signing with `secret`.
    pub fn new(secret: [u8; SECRET_SIZE]) -> Self {
        Self {
            secret: Zeroizing::new(secret),
        }
    }

    /// Mints the signed token carrying `claim`.
    ///
    /// Deterministic for a given claim and secret.
    pub fn issue(&self, claim: &SessionClaim) -> String {
        let payload = encode_claim(claim);
        let tag = blake3::keyed_hash(&self.secret, &payload);
        format!(
            "{}.{}",
            general_purpose::URL_SAFE_NO_PAD.encode(&payload),
            general_purpose::URL_SAFE_NO_PAD.encode(tag.as_bytes()),
        )
    }

    /// Verifies `token` and returns its claim.
    ///
    /// The integrity tag is validated before any claim field is trusted;
    /// only then is the expiry window checked against `now`. An attacker
    /// must not be able to produce an `Expired` verdict on unsigned data.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaim, TokenError> {
        let (payload_b64, tag_b64) = token.split_once('.').ok_or(TokenError::Malformed)?;
        if tag_b64.contains('.') {
            return Err(TokenError::Malformed);
        }

        let payload = general_purpose::URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenError::Malformed)?;
        let tag: [u8; TAG_SIZE] = general_purpose::URL_SAFE_NO_PAD
            .decode(tag_b64)
            .map_err(|_| TokenError::Malformed)?
            .try_into()
            .map_err(|_| TokenError::Malformed)?;

        let expected = blake3::keyed_hash(&self.secret, &payload);
        if !bool::from(expected.as_bytes().ct_eq(&tag)) {
            return Err(TokenError::Tampered);
        }

        // The tag matched, so the payload is authentic; a decode failure
        // here means a signing-side incompatibility, not an attack.
        let claim = decode_claim(&payload).ok_or(TokenError::Malformed)?;
        if now > claim.expires_at {
            return Err(TokenError::Expired);
        }

        Ok(claim)
    }
}

/// Canonical byte layout of a claim:
///
/// ```text
/// version (1 byte)
/// + session_id (16 bytes)
/// + issued_at millis (8 bytes LE)
/// + expires_at millis (8 bytes LE)
/// + class_id_len (4 bytes LE) + class_id bytes
/// + issuer_id_len (4 bytes LE) + issuer_id bytes
/// ```
fn encode_claim(claim: &SessionClaim) -> Vec<u8> {
    let class_bytes = claim.class_id.as_bytes();
    let issuer_bytes = claim.issuer_id.as_bytes();

    let mut out =
        Vec::with_capacity(1 + 16 + 8 + 8 + 4 + class_bytes.len() + 4 + issuer_bytes.len());
    out.push(CLAIM_VERSION);
    out.extend_from_slice(claim.session_id.as_bytes());
    out.extend_from_slice(&claim.issued_at.timestamp_millis().to_le_bytes());
    out.extend_from_slice(&claim.expires_at.timestamp_millis().to_le_bytes());
    out.extend_from_slice(&(class_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(class_bytes);
    out.extend_from_slice(&(issuer_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(issuer_bytes);
    out
}

/// Parses the canonical layout back into a claim. Fail-closed: unknown
/// versions, short reads, oversized fields, and trailing bytes all yield
/// `None`.
fn decode_claim(bytes: &[u8]) -> Option<SessionClaim> {
    let mut cursor = bytes;

    if *take_byte(&mut cursor)? != CLAIM_VERSION {
        return None;
    }
    let session_id = Uuid::from_slice(take(&mut cursor, 16)?).ok()?;
    let issued_at = take_timestamp(&mut cursor)?;
    let expires_at = take_timestamp(&mut cursor)?;
    let class_id = take_string(&mut cursor)?;
    let issuer_id = take_string(&mut cursor)?;

    if !cursor.is_empty() {
        return None;
    }

    Some(SessionClaim {
        session_id,
        class_id,
        issuer_id,
        issued_at,
        expires_at,
    })
}

fn take<'a>(cursor: &mut &'a [u8], len: usize) -> Option<&'a [u8]> {
    if cursor.len() < len {
        return None;
    }
    let (head, rest) = cursor.split_at(len);
    *cursor = rest;
    Some(head)
}

fn take_byte<'a>(cursor: &mut &'a [u8]) -> Option<&'a u8> {
    take(cursor, 1).map(|b| &b[0])
}

fn take_timestamp(cursor: &mut &[u8]) -> Option<DateTime<Utc>> {
    let millis = i64::from_le_bytes(take(cursor, 8)?.try_into().ok()?);
    Utc.timestamp_millis_opt(millis).single()
}

fn take_string(cursor: &mut &[u8]) -> Option<String> {
    let len = u32::from_le_bytes(take(cursor, 4)?.try_into().ok()?) as usize;
    if len > MAX_FIELD_LEN {
        return None;
    }
    String::from_utf8(take(cursor, len)?.to_vec()).ok()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new([0x42; SECRET_SIZE])
    }

    fn claim_at(now: DateTime<Utc>) -> SessionClaim {
        SessionClaim {
            session_id: Uuid::new_v4(),
            class_id: "CS101".to_string(),
            issuer_id: "fac1".to_string(),
            issued_at: now,
            expires_at: now + Duration::seconds(10),
        }
    }

    fn test_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    #[test]
    fn round_trip_within_validity_window() {
        let codec = codec();
        let now = test_now();
        let claim = claim_at(now);

        let token = codec.issue(&claim);
        assert_eq!(codec.verify(&token, now), Ok(claim.clone()));
        assert_eq!(
            codec.verify(&token, claim.expires_at),
            Ok(claim),
            "a token is still valid at the expiry instant itself"
        );
    }

    #[test]
    fn issue_is_deterministic() {
        let codec = codec();
        let claim = claim_at(test_now());
        assert_eq!(codec.issue(&claim), codec.issue(&claim));
    }

    #[test]
    fn expired_token_has_its_own_discriminator() {
        let codec = codec();
        let now = test_now();
        let token = codec.issue(&claim_at(now));

        let result = codec.verify(&token, now + Duration::seconds(11));
        assert_eq!(result, Err(TokenError::Expired));
    }

    #[test]
    fn wrong_secret_is_tampered_even_when_expired() {
        let signer = TokenCodec::new([0x01; SECRET_SIZE]);
        let verifier = TokenCodec::new([0x02; SECRET_SIZE]);
        let now = test_now();
        let token = signer.issue(&claim_at(now));

        // The expiry embedded in the claim has long lapsed, but integrity
        // is checked first, so the verdict must be Tampered.
        let result = verifier.verify(&token, now + Duration::days(365));
        assert_eq!(result, Err(TokenError::Tampered));
    }

    #[test]
    fn every_single_bit_flip_fails_verification() {
        let codec = codec();
        let now = test_now();
        let token = codec.issue(&claim_at(now));
        let bytes = token.as_bytes();

        for index in 0..bytes.len() {
            for bit in 0..8 {
                let mut mutated = bytes.to_vec();
                mutated[index] ^= 1 << bit;
                // Some flips leave the ASCII range; those can never be
                // submitted as a token string in the first place.
                let Ok(mutated) = String::from_utf8(mutated) else {
                    continue;
                };

                let result = codec.verify(&mutated, now);
                assert!(
                    matches!(result, Err(TokenError::Tampered) | Err(TokenError::Malformed)),
                    "flip of bit {bit} at byte {index} produced {result:?}"
                );
            }
        }
    }

    #[test]
    fn garbage_strings_are_malformed() {
        let codec = codec();
        let now = test_now();

        for garbage in ["", "no-separator", "a.b.c", "!!!.###", "YWJj.YWJj"] {
            let result = codec.verify(garbage, now);
            assert!(
                matches!(result, Err(TokenError::Malformed) | Err(TokenError::Tampered)),
                "{garbage:?} produced {result:?}"
            );
        }
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let codec = codec();
        let now = test_now();
        let token = codec.issue(&claim_at(now));

        let (payload_b64, tag_b64) = token.split_once('.').unwrap();
        let truncated = format!("{}.{}", &payload_b64[..payload_b64.len() - 4], tag_b64);
        assert!(codec.verify(&truncated, now).is_err());
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let claim = claim_at(test_now());
        let mut payload = encode_claim(&claim);
        payload.push(0);
        assert_eq!(decode_claim(&payload), None);
    }

    #[test]
    fn decode_rejects_unknown_version() {
        let claim = claim_at(test_now());
        let mut payload = encode_claim(&claim);
        payload[0] = 2;
        assert_eq!(decode_claim(&payload), None);
    }
}
