use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::models::attendance::{AttendanceEntry, AttendanceEntryDraft};

/// Errors produced when recording a redemption.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LedgerError {
    /// The subject already holds `periods_per_day` entries for this day.
    #[error("daily attendance limit reached")]
    DailyLimitReached,
}

/// All entries recorded for one subject, in redemption order.
#[derive(Default)]
struct SubjectBook {
    entries: Vec<AttendanceEntry>,
}

/// Append-only idempotent store of attendance facts.
///
/// At most one entry exists per (subject, session) and at most
/// `periods_per_day` per subject and calendar day. Entries are sharded into
/// per-subject books, each behind its own mutex: the existence check and the
/// insert for a given subject happen under one lock acquisition, so two
/// concurrent redemptions of the same token by the same subject produce
/// exactly one row, and `period_index` assignment is serialized per subject
/// without blocking other subjects.
#[derive(Clone)]
pub struct AttendanceLedger {
    periods_per_day: u32,
    books: Arc<RwLock<HashMap<String, Arc<Mutex<SubjectBook>>>>>,
}

impl AttendanceLedger {
    /// Creates an empty ledger capped at `periods_per_day` entries per
    /// subject and day.
    pub fn new(periods_per_day: u32) -> Self {
        Self {
            periods_per_day,
            books: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn book(&self, subject_id: &str) -> Arc<Mutex<SubjectBook>> {
        if let Some(book) = self.books.read().await.get(subject_id) {
            return book.clone();
        }
        let mut books = self.books.write().await;
        books.entry(subject_id.to_string()).or_default().clone()
    }

    /// Records `draft` unless the subject already redeemed this session.
    ///
    /// An existing (subject, session) entry is returned unchanged: scanning
    /// the same still-valid token twice is a no-op success, even when the
    /// daily limit has been reached since. Otherwise the entry is inserted
    /// with `period_index` equal to the number of entries the subject
    /// already holds for the calendar day of `now`.
    pub async fn record_if_absent(
        &self,
        draft: AttendanceEntryDraft,
        now: DateTime<Utc>,
    ) -> Result<AttendanceEntry, LedgerError> {
        let book = self.book(&draft.subject_id).await;
        let mut book = book.lock().await;

        if let Some(existing) = book
            .entries
            .iter()
            .find(|entry| entry.session_id == draft.session_id)
        {
            return Ok(existing.clone());
        }

        let day = now.date_naive();
        let taken = book
            .entries
            .iter()
            .filter(|entry| entry.recorded_at.date_naive() == day)
            .count() as u32;
        if taken >= self.periods_per_day {
            return Err(LedgerError::DailyLimitReached);
        }

        let entry = AttendanceEntry {
            subject_id: draft.subject_id,
            session_id: draft.session_id,
            class_id: draft.class_id,
            issuer_id: draft.issuer_id,
            period_index: taken,
            recorded_at: now,
        };
        book.entries.push(entry.clone());
        Ok(entry)
    }

    /// Returns the subject's entries for `day`, ordered by `period_index`
    /// ascending.
    pub async fn entries_for(&self, subject_id: &str, day: NaiveDate) -> Vec<AttendanceEntry> {
        let Some(book) = self.books.read().await.get(subject_id).cloned() else {
            return Vec::new();
        };
        let book = book.lock().await;

        let mut entries: Vec<AttendanceEntry> = book
            .entries
            .iter()
            .filter(|entry| entry.recorded_at.date_naive() == day)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.period_index);
        entries
    }

    /// Returns every entry recorded against `session_id`, for issuer-side
    /// rosters, ordered by recording time.
    pub async fn entries_for_session(&self, session_id: Uuid) -> Vec<AttendanceEntry> {
        let books: Vec<Arc<Mutex<SubjectBook>>> =
            self.books.read().await.values().cloned().collect();

        let mut entries = Vec::new();
        for book in books {
            let book = book.lock().await;
            entries.extend(
                book.entries
                    .iter()
                    .filter(|entry| entry.session_id == session_id)
                    .cloned(),
            );
        }
        entries.sort_by_key(|entry| entry.recorded_at);
        entries
    }
}
