use chrono::Duration;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::models::attendance::AttendanceEntry;
use crate::models::session::Session;
use crate::state::AppState;

/// A freshly opened session together with its signed token.
pub struct IssuedToken {
    pub session: Session,
    pub token: String,
}

/// Opens a session for `class_id` owned by `issuer_id` and mints its token.
///
/// One session yields exactly one token; requesting a new token opens a new
/// session.
pub async fn open_session(state: &AppState, class_id: &str, issuer_id: &str) -> IssuedToken {
    let now = state.clock.now();
    let ttl = Duration::seconds(state.config.token_ttl_seconds as i64);

    let session = state.registry.open_session(class_id, issuer_id, now, ttl).await;
    let token = state.codec.issue(&session.claim());

    tracing::info!(
        "✅ Session {} opened for class {} by {}, valid {}s",
        session.session_id,
        session.class_id,
        session.issuer_id,
        state.config.token_ttl_seconds,
    );

    IssuedToken { session, token }
}

/// Returns the roster of a session, restricted to the issuer that owns it.
pub async fn session_entries(
    state: &AppState,
    session_id: Uuid,
    issuer_id: &str,
) -> Result<Vec<AttendanceEntry>> {
    let session = state
        .registry
        .get(session_id)
        .await
        .ok_or(AppError::NotFound)?;

    if session.issuer_id != issuer_id {
        return Err(AppError::Unauthorized);
    }

    Ok(state.ledger.entries_for_session(session_id).await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::clock::MockClock;
    use crate::config::Config;
    use crate::models::attendance::AttendanceEntryDraft;

    fn test_state() -> AppState {
        let clock = MockClock::at(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
        AppState::with_clock(&Config::for_tests(), Arc::new(clock)).unwrap()
    }

    #[tokio::test]
    async fn issued_token_verifies_against_its_own_claim() {
        let state = test_state();
        let issued = open_session(&state, "CS101", "fac1").await;

        let claim = state
            .codec
            .verify(&issued.token, state.clock.now())
            .unwrap();
        assert_eq!(claim.session_id, issued.session.session_id);
        assert_eq!(claim.class_id, "CS101");
        assert_eq!(claim.issuer_id, "fac1");
    }

    #[tokio::test]
    async fn roster_is_restricted_to_the_owning_issuer() {
        let state = test_state();
        let issued = open_session(&state, "CS101", "fac1").await;

        state
            .ledger
            .record_if_absent(
                AttendanceEntryDraft {
                    subject_id: "stu1".to_string(),
                    session_id: issued.session.session_id,
                    class_id: "CS101".to_string(),
                    issuer_id: "fac1".to_string(),
                },
                state.clock.now(),
            )
            .await
            .unwrap();

        let entries = session_entries(&state, issued.session.session_id, "fac1")
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);

        assert!(matches!(
            session_entries(&state, issued.session.session_id, "fac2").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            session_entries(&state, Uuid::new_v4(), "fac1").await,
            Err(AppError::NotFound)
        ));
    }
}
