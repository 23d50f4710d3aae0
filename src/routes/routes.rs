//! Defines routes for the interview session API.
//!
//! ## Structure
//! - **Session endpoints**
//!   - `POST /api/interview/start?user_id=` — create a session
//!   - `GET  /api/interview/{session_id}/status`
//!   - `POST /api/interview/{session_id}/transcript`
//!   - `GET  /api/interview/{session_id}/ice-servers`
//!   - `GET  /api/interview/{session_id}/results`
//!   - `POST /api/interview/{session_id}/end`
//!
//! - **Signaling endpoints** (per session, poll model)
//!   - `POST/GET /api/interview/{session_id}/rtc/offer`
//!   - `POST/GET /api/interview/{session_id}/rtc/answer`
//!   - `POST/GET /api/interview/{session_id}/rtc/ice-candidate`
//!
//! Health endpoints (`/healthz`, `/readyz`) are mounted at the root.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        session_handlers::{
            end_interview, get_ice_servers, get_results, get_status, root, start_interview,
            update_transcript,
        },
        signaling_handlers::{
            get_answer, get_candidates, get_offer, post_answer, post_candidate, post_offer,
        },
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router for the whole API.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/", get(root))
        // Session lifecycle
        .route("/api/interview/start", post(start_interview))
        .route("/api/interview/{session_id}/status", get(get_status))
        .route(
            "/api/interview/{session_id}/transcript",
            post(update_transcript),
        )
        .route(
            "/api/interview/{session_id}/ice-servers",
            get(get_ice_servers),
        )
        .route("/api/interview/{session_id}/results", get(get_results))
        .route("/api/interview/{session_id}/end", post(end_interview))
        // Signaling relay
        .route(
            "/api/interview/{session_id}/rtc/offer",
            post(post_offer).get(get_offer),
        )
        .route(
            "/api/interview/{session_id}/rtc/answer",
            post(post_answer).get(get_answer),
        )
        .route(
            "/api/interview/{session_id}/rtc/ice-candidate",
            post(post_candidate).get(get_candidates),
        )
}
