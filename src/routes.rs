use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};

use crate::{handlers, middleware_layer, state::AppState};

/// Assembles the application router.
///
/// Issuer routes and subject routes each sit behind their own identity
/// middleware; rate limiting and tracing are layered on in `main` so tests
/// can drive this router directly.
pub fn create_router(state: AppState) -> Router {
    let issuer_routes = Router::new()
        .route("/sessions", post(handlers::sessions::open_session))
        .route(
            "/sessions/{session_id}/entries",
            get(handlers::sessions::session_entries),
        )
        .route(
            "/sessions/{session_id}/entries.csv",
            get(handlers::sessions::session_entries_csv),
        )
        .route_layer(from_fn(middleware_layer::auth::require_issuer))
        .with_state(state.clone());

    let subject_routes = Router::new()
        .route("/redemptions", post(handlers::redemptions::redeem))
        .route("/attendance/me", get(handlers::redemptions::own_attendance))
        .route_layer(from_fn(middleware_layer::auth::require_subject))
        .with_state(state);

    Router::new().merge(issuer_routes).merge(subject_routes)
}
