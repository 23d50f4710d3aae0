//! HTTP handlers for the per-session WebRTC signaling relay.
//!
//! The caller posts its offer and polls for the answer; the callee reads
//! the offer and posts its answer. ICE candidates trickle through
//! per-role mailboxes. Media never touches this service.

use crate::{
    errors::AppError,
    models::signaling::{IceCandidate, SessionDescription},
    services::signaling_service::PeerRole,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct OfferResponse {
    pub offer: Option<SessionDescription>,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer: Option<SessionDescription>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePost {
    pub role: String,
    pub candidate: IceCandidate,
}

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct CandidatesResponse {
    pub candidates: Vec<IceCandidate>,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub status: &'static str,
}

/// Reject signaling against missing or ended sessions, and make sure an
/// active session has a channel even after a process restart.
async fn ensure_channel(state: &AppState, session_id: &str) -> Result<(), AppError> {
    let session = state.sessions.fetch_session(session_id).await?;
    if session.is_ended() {
        return Err(AppError::new(
            StatusCode::CONFLICT,
            format!("session `{}` has already ended", session_id),
        ));
    }
    state.signaling.open(session_id).await;
    Ok(())
}

/// POST `/api/interview/{session_id}/rtc/offer`
pub async fn post_offer(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(offer): Json<SessionDescription>,
) -> Result<Json<AcceptedResponse>, AppError> {
    if offer.sdp_type != "offer" {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            format!("expected type `offer`, got `{}`", offer.sdp_type),
        ));
    }
    ensure_channel(&state, &session_id).await?;
    state.signaling.put_offer(&session_id, offer).await?;
    Ok(Json(AcceptedResponse { status: "accepted" }))
}

/// GET `/api/interview/{session_id}/rtc/offer` — callee side; `offer` is
/// null until the caller has posted one.
pub async fn get_offer(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<OfferResponse>, AppError> {
    ensure_channel(&state, &session_id).await?;
    let offer = state.signaling.get_offer(&session_id).await?;
    Ok(Json(OfferResponse { offer }))
}

/// POST `/api/interview/{session_id}/rtc/answer`
pub async fn post_answer(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(answer): Json<SessionDescription>,
) -> Result<Json<AcceptedResponse>, AppError> {
    if answer.sdp_type != "answer" {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            format!("expected type `answer`, got `{}`", answer.sdp_type),
        ));
    }
    ensure_channel(&state, &session_id).await?;
    state.signaling.put_answer(&session_id, answer).await?;
    Ok(Json(AcceptedResponse { status: "accepted" }))
}

/// GET `/api/interview/{session_id}/rtc/answer` — caller polls; `answer`
/// is null until the callee responds.
pub async fn get_answer(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<AnswerResponse>, AppError> {
    ensure_channel(&state, &session_id).await?;
    let answer = state.signaling.get_answer(&session_id).await?;
    Ok(Json(AnswerResponse { answer }))
}

/// POST `/api/interview/{session_id}/rtc/ice-candidate` — queue a candidate
/// for the opposite peer.
pub async fn post_candidate(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(post): Json<CandidatePost>,
) -> Result<Json<AcceptedResponse>, AppError> {
    let role = PeerRole::parse(&post.role)?;
    ensure_channel(&state, &session_id).await?;
    state
        .signaling
        .push_candidate(&session_id, role, post.candidate)
        .await?;
    Ok(Json(AcceptedResponse { status: "accepted" }))
}

/// GET `/api/interview/{session_id}/rtc/ice-candidate?role=` — drain the
/// mailbox for `role`.
pub async fn get_candidates(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(q): Query<RoleQuery>,
) -> Result<Json<CandidatesResponse>, AppError> {
    let role = PeerRole::parse(&q.role)?;
    ensure_channel(&state, &session_id).await?;
    let candidates = state.signaling.drain_candidates(&session_id, role).await?;
    Ok(Json(CandidatesResponse { candidates }))
}
