use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The signed contents of a session token.
///
/// A claim is produced once, at issuance time, and is immutable afterwards.
/// Its fields are only ever trusted after the token's integrity tag has been
/// validated. Invariant: `expires_at > issued_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaim {
    /// The session this token was minted for.
    pub session_id: Uuid,
    /// The class the session belongs to.
    pub class_id: String,
    /// The instructor that opened the session.
    pub issuer_id: String,
    /// The timestamp when the token was minted.
    pub issued_at: DateTime<Utc>,
    /// The timestamp after which the token is no longer redeemable.
    pub expires_at: DateTime<Utc>,
}
