use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::Result, middleware_layer::auth::IssuerIdentity, services::issuance as issuance_service,
    state::AppState, validation::validate_class_id,
};

/// The request payload for opening a session.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    pub class_id: String,
}

/// The response payload for a freshly opened session.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionResponse {
    pub session_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// One roster row.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub subject_id: String,
    pub hour: u32,
    pub recorded_at: DateTime<Utc>,
}

/// Opens an attendance session and returns its signed token. The caller's
/// identity becomes the session owner; it never comes from the body.
#[axum::debug_handler]
pub async fn open_session(
    State(state): State<AppState>,
    Extension(issuer): Extension<IssuerIdentity>,
    Json(payload): Json<OpenSessionRequest>,
) -> Result<impl IntoResponse> {
    validate_class_id(&payload.class_id)?;

    let issued = issuance_service::open_session(&state, &payload.class_id, &issuer.0).await;

    Ok((
        StatusCode::CREATED,
        Json(OpenSessionResponse {
            session_id: issued.session.session_id,
            token: issued.token,
            expires_at: issued.session.expires_at,
        }),
    ))
}

/// Returns the roster of a session owned by the caller.
#[axum::debug_handler]
pub async fn session_entries(
    State(state): State<AppState>,
    Extension(issuer): Extension<IssuerIdentity>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<RosterEntry>>> {
    let entries = issuance_service::session_entries(&state, session_id, &issuer.0).await?;

    Ok(Json(
        entries
            .into_iter()
            .map(|entry| RosterEntry {
                subject_id: entry.subject_id,
                hour: entry.period_index,
                recorded_at: entry.recorded_at,
            })
            .collect(),
    ))
}

/// Returns the roster as CSV, for spreadsheet import.
#[axum::debug_handler]
pub async fn session_entries_csv(
    State(state): State<AppState>,
    Extension(issuer): Extension<IssuerIdentity>,
    Path(session_id): Path<Uuid>,
) -> Result<Response> {
    let entries = issuance_service::session_entries(&state, session_id, &issuer.0).await?;

    let mut csv = String::from("subject_id,hour,recorded_at\n");
    for entry in &entries {
        csv.push_str(&format!(
            "{},{},{}\n",
            csv_field(&entry.subject_id),
            entry.period_index,
            entry.recorded_at.to_rfc3339(),
        ));
    }

    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv).into_response())
}

/// Quotes a field when it would break the row otherwise.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
