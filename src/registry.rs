use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::claim::SessionClaim;
use crate::models::session::Session;

/// Errors produced when authorizing a redemption against the registry.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthzError {
    /// The claim references a session this registry never opened.
    #[error("session is not known")]
    UnknownSession,
    /// The session's validity window has lapsed.
    #[error("session has expired")]
    SessionExpired,
    /// The claim's issuer does not own the session.
    #[error("claim issuer does not own the session")]
    IssuerMismatch,
}

/// Tracks open attendance sessions and authorizes redemptions against them.
///
/// Expiry is double-checked here on top of the claim's own window: the
/// signed claim is the tamper-evident source of truth, while the registry
/// copy lets a session be closed early without waiting for the signature
/// to lapse. Expired sessions are retained for issuer-side roster reads;
/// authorization rejects them lazily, so no sweeper task is needed.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Opens a new session for `class_id`, owned by `issuer_id`, valid for
    /// `ttl` starting at `now`.
    pub async fn open_session(
        &self,
        class_id: &str,
        issuer_id: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Session {
        let session = Session {
            session_id: Uuid::new_v4(),
            class_id: class_id.to_string(),
            issuer_id: issuer_id.to_string(),
            created_at: now,
            expires_at: now + ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(session.session_id, session.clone());
        session
    }

    /// Authorizes a verified claim against the registry's view of its
    /// session. Returns the session on success.
    pub async fn authorize(
        &self,
        claim: &SessionClaim,
        now: DateTime<Utc>,
    ) -> Result<Session, AuthzError> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(&claim.session_id)
            .ok_or(AuthzError::UnknownSession)?;

        if now > session.expires_at {
            return Err(AuthzError::SessionExpired);
        }
        // Degenerates to an equality tautology while one process-wide secret
        // signs every token; kept so per-issuer secrets stay a config change.
        if claim.issuer_id != session.issuer_id {
            return Err(AuthzError::IssuerMismatch);
        }

        Ok(session.clone())
    }

    /// Looks up a session by id, expired or not.
    pub async fn get(&self, session_id: Uuid) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions.get(&session_id).cloned()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn test_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn open_then_authorize_succeeds() {
        let registry = SessionRegistry::new();
        let now = test_now();

        let session = registry
            .open_session("CS101", "fac1", now, Duration::seconds(10))
            .await;
        assert_eq!(session.expires_at, now + Duration::seconds(10));

        let authorized = registry.authorize(&session.claim(), now).await.unwrap();
        assert_eq!(authorized.session_id, session.session_id);
        assert_eq!(authorized.class_id, "CS101");
    }

    #[tokio::test]
    async fn unknown_session_is_rejected() {
        let registry = SessionRegistry::new();
        let now = test_now();
        let session = registry
            .open_session("CS101", "fac1", now, Duration::seconds(10))
            .await;

        let mut claim = session.claim();
        claim.session_id = Uuid::new_v4();

        assert_eq!(
            registry.authorize(&claim, now).await,
            Err(AuthzError::UnknownSession)
        );
    }

    #[tokio::test]
    async fn expired_session_is_rejected_but_retained() {
        let registry = SessionRegistry::new();
        let now = test_now();
        let session = registry
            .open_session("CS101", "fac1", now, Duration::seconds(10))
            .await;

        let later = now + Duration::seconds(11);
        assert_eq!(
            registry.authorize(&session.claim(), later).await,
            Err(AuthzError::SessionExpired)
        );
        assert!(registry.get(session.session_id).await.is_some());
    }

    #[tokio::test]
    async fn issuer_mismatch_is_rejected() {
        let registry = SessionRegistry::new();
        let now = test_now();
        let session = registry
            .open_session("CS101", "fac1", now, Duration::seconds(10))
            .await;

        let mut claim = session.claim();
        claim.issuer_id = "fac2".to_string();

        assert_eq!(
            registry.authorize(&claim, now).await,
            Err(AuthzError::IssuerMismatch)
        );
    }
}
