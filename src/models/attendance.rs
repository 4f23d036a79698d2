use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A recorded attendance fact.
///
/// Entries are append-only: they are created by successful redemption and
/// never mutated or deleted afterwards. At most one entry exists per
/// (subject, session), and at most `periods_per_day` per subject and
/// calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceEntry {
    /// The student that was marked present.
    pub subject_id: String,
    /// The session the entry was recorded against.
    pub session_id: Uuid,
    /// The class the session belongs to.
    pub class_id: String,
    /// The instructor that owned the session.
    pub issuer_id: String,
    /// Ordinal slot of the day's sessions this entry fills, 0-based.
    /// Derived from redemption order, never chosen by the student.
    pub period_index: u32,
    /// The timestamp when the entry was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// The subject/session pairing a redemption wants recorded; the ledger
/// fills in `period_index` and `recorded_at`.
#[derive(Debug, Clone)]
pub struct AttendanceEntryDraft {
    pub subject_id: String,
    pub session_id: Uuid,
    pub class_id: String,
    pub issuer_id: String,
}
