use serde::Serialize;

use crate::clock::Clock;
use crate::crypto::token::TokenError;
use crate::ledger::LedgerError;
use crate::models::attendance::{AttendanceEntry, AttendanceEntryDraft};
use crate::registry::AuthzError;
use crate::state::AppState;

/// Why a redemption was turned away. Serialized verbatim into the
/// redemption response so clients can branch without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MalformedToken,
    TamperedToken,
    Expired,
    UnknownSession,
    SessionExpired,
    IssuerMismatch,
    DailyLimitReached,
}

impl RejectReason {
    /// The user-visible message for this rejection.
    pub fn message(self) -> &'static str {
        match self {
            Self::MalformedToken | Self::TamperedToken => "Invalid QR code",
            Self::Expired => "QR code expired",
            Self::UnknownSession => "Unknown attendance session",
            Self::SessionExpired => "Attendance session has closed",
            Self::IssuerMismatch => "QR code was not issued for this session",
            Self::DailyLimitReached => "Daily attendance limit reached",
        }
    }
}

impl From<TokenError> for RejectReason {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed => Self::MalformedToken,
            TokenError::Tampered => Self::TamperedToken,
            TokenError::Expired => Self::Expired,
        }
    }
}

impl From<AuthzError> for RejectReason {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::UnknownSession => Self::UnknownSession,
            AuthzError::SessionExpired => Self::SessionExpired,
            AuthzError::IssuerMismatch => Self::IssuerMismatch,
        }
    }
}

impl From<LedgerError> for RejectReason {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::DailyLimitReached => Self::DailyLimitReached,
        }
    }
}

/// The result of one redemption attempt.
#[derive(Debug, Clone)]
pub enum RedemptionOutcome {
    /// The subject is marked present; repeat scans return the same entry.
    Marked(AttendanceEntry),
    /// The attempt was turned away; no ledger row was touched.
    Rejected(RejectReason),
}

/// Redeems `raw_token` for `subject_id`: verify, authorize, record.
///
/// One timestamp is sampled per attempt and threaded through every step so
/// the token check, the registry check, and the ledger row agree on when
/// the redemption happened. A rejected token never creates a ledger row.
pub async fn redeem(state: &AppState, raw_token: &str, subject_id: &str) -> RedemptionOutcome {
    let now = state.clock.now();

    let claim = match state.codec.verify(raw_token, now) {
        Ok(claim) => claim,
        Err(err) => {
            tracing::warn!("❌ Token rejected for subject {}: {}", subject_id, err);
            return RedemptionOutcome::Rejected(err.into());
        }
    };

    let session = match state.registry.authorize(&claim, now).await {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!(
                "❌ Session {} refused for subject {}: {}",
                claim.session_id,
                subject_id,
                err
            );
            return RedemptionOutcome::Rejected(err.into());
        }
    };

    let draft = AttendanceEntryDraft {
        subject_id: subject_id.to_string(),
        session_id: session.session_id,
        class_id: session.class_id.clone(),
        issuer_id: session.issuer_id.clone(),
    };

    match state.ledger.record_if_absent(draft, now).await {
        Ok(entry) => {
            tracing::info!(
                "✅ Subject {} marked present for class {} of {} (hour {})",
                entry.subject_id,
                entry.class_id,
                entry.issuer_id,
                entry.period_index
            );
            RedemptionOutcome::Marked(entry)
        }
        Err(err) => {
            tracing::warn!("❌ Recording refused for subject {}: {}", subject_id, err);
            RedemptionOutcome::Rejected(err.into())
        }
    }
}
