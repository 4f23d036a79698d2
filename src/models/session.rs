use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::claim::SessionClaim;

/// An attendance-taking session: one class, one hour, one instructor.
///
/// Created when an instructor requests a token. The registry copy of
/// `expires_at` is authoritative for authorization, so a session can be
/// closed ahead of its token's signature lapsing. Expired sessions are
/// retained so issuer-side roster reads keep working after the class ends.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Unique identifier of this session.
    pub session_id: Uuid,
    /// The class this session belongs to.
    pub class_id: String,
    /// The instructor that opened this session.
    pub issuer_id: String,
    /// The timestamp when the session was opened.
    pub created_at: DateTime<Utc>,
    /// The timestamp after which redemptions are rejected.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// The claim minted into this session's token.
    pub fn claim(&self) -> SessionClaim {
        SessionClaim {
            session_id: self.session_id,
            class_id: self.class_id.clone(),
            issuer_id: self.issuer_id.clone(),
            issued_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}
