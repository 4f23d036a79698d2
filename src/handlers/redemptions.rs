use axum::{Extension, Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    clock::Clock,
    middleware_layer::auth::SubjectIdentity,
    services::redemption::{self as redemption_service, RedemptionOutcome, RejectReason},
    state::AppState,
};

/// The request payload for redeeming a token.
#[derive(Deserialize, Debug)]
pub struct RedeemRequest {
    pub token: String,
}

/// The response payload for a redemption attempt.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    pub message: String,
}

/// One of the caller's own attendance entries.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnEntry {
    pub class_id: String,
    pub hour: u32,
    pub recorded_at: DateTime<Utc>,
}

/// The caller's attendance status for the current day.
#[derive(Serialize)]
pub struct OwnAttendanceResponse {
    pub status: String,
    pub entries: Vec<OwnEntry>,
}

/// Redeems a scanned token for the authenticated student.
///
/// Every expected rejection comes back as a structured outcome with
/// `success: false`, not as an error status; the only non-2xx paths are
/// missing identity and malformed request bodies.
#[axum::debug_handler]
pub async fn redeem(
    State(state): State<AppState>,
    Extension(subject): Extension<SubjectIdentity>,
    Json(payload): Json<RedeemRequest>,
) -> Json<RedeemResponse> {
    match redemption_service::redeem(&state, &payload.token, &subject.0).await {
        RedemptionOutcome::Marked(entry) => Json(RedeemResponse {
            success: true,
            reason: None,
            hour: Some(entry.period_index),
            message: "Attendance marked successfully".to_string(),
        }),
        RedemptionOutcome::Rejected(reason) => Json(RedeemResponse {
            success: false,
            reason: Some(reason),
            hour: None,
            message: reason.message().to_string(),
        }),
    }
}

/// Returns the authenticated student's own record for today.
#[axum::debug_handler]
pub async fn own_attendance(
    State(state): State<AppState>,
    Extension(subject): Extension<SubjectIdentity>,
) -> Json<OwnAttendanceResponse> {
    let today = state.clock.now().date_naive();
    let entries = state.ledger.entries_for(&subject.0, today).await;

    let status = if entries.is_empty() {
        "absent"
    } else {
        "present"
    };

    Json(OwnAttendanceResponse {
        status: status.to_string(),
        entries: entries
            .into_iter()
            .map(|entry| OwnEntry {
                class_id: entry.class_id,
                hour: entry.period_index,
                recorded_at: entry.recorded_at,
            })
            .collect(),
    })
}
