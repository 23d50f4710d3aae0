//! HTTP handlers for the interview session lifecycle.
//! Payload shapes stay close to what the browser frontend and the voice
//! agent already exchange; all session state lives in `SessionService`.

use crate::{
    errors::AppError,
    models::{signaling::IceServersResponse, transcript::Speaker},
    services::session_service::{SessionResults, SessionStatus},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct StartQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct RtcEndpoints {
    pub offer: String,
    pub answer: String,
    pub ice_candidate: String,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub session_id: String,
    pub status: &'static str,
    pub message: &'static str,
    pub rtc_endpoints: RtcEndpoints,
}

/// Transcript fragment posted by the voice agent.
///
/// `type` selects the variant: `user_transcript` / `assistant_transcript`
/// carry `text`, `interest_detected` carries `interest`.
#[derive(Debug, Deserialize)]
pub struct TranscriptUpdate {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>,
    pub interest: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub status: &'static str,
}

/// GET `/` — service banner.
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Interview session service is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST `/api/interview/start?user_id=` — create a session and open its
/// signaling channel.
pub async fn start_interview(
    State(state): State<AppState>,
    Query(q): Query<StartQuery>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.start_session(&q.user_id).await?;
    state.signaling.open(&session.session_id).await;

    let base = format!("/api/interview/{}/rtc", session.session_id);
    Ok((
        StatusCode::CREATED,
        Json(StartResponse {
            session_id: session.session_id,
            status: "started",
            message: "Interview session started. Use the rtc endpoints for WebRTC signaling.",
            rtc_endpoints: RtcEndpoints {
                offer: format!("{}/offer", base),
                answer: format!("{}/answer", base),
                ice_candidate: format!("{}/ice-candidate", base),
            },
        }),
    ))
}

/// GET `/api/interview/{session_id}/status`
pub async fn get_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStatus>, AppError> {
    Ok(Json(state.sessions.session_status(&session_id).await?))
}

/// POST `/api/interview/{session_id}/transcript`
pub async fn update_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(update): Json<TranscriptUpdate>,
) -> Result<Json<UpdatedResponse>, AppError> {
    match update.kind.as_str() {
        "user_transcript" | "assistant_transcript" => {
            let text = update.text.as_deref().ok_or_else(|| {
                AppError::new(StatusCode::BAD_REQUEST, "missing `text` field")
            })?;
            let speaker = if update.kind.starts_with("user") {
                Speaker::User
            } else {
                Speaker::Assistant
            };
            state
                .sessions
                .append_transcript(&session_id, speaker, text)
                .await?;
        }
        "interest_detected" => {
            let interest = update.interest.as_deref().ok_or_else(|| {
                AppError::new(StatusCode::BAD_REQUEST, "missing `interest` field")
            })?;
            let session = state.sessions.fetch_session(&session_id).await?;
            if session.is_ended() {
                return Err(AppError::new(
                    StatusCode::CONFLICT,
                    format!("session `{}` has already ended", session_id),
                ));
            }
            state
                .sessions
                .record_interest(&session, interest, None, 1.0)
                .await?;
        }
        other => {
            return Err(AppError::new(
                StatusCode::BAD_REQUEST,
                format!("unknown transcript type `{}`", other),
            ));
        }
    }

    Ok(Json(UpdatedResponse { status: "updated" }))
}

/// GET `/api/interview/{session_id}/ice-servers` — ICE configuration with
/// time-limited TURN credentials scoped to this session.
pub async fn get_ice_servers(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<IceServersResponse>, AppError> {
    let session = state.sessions.fetch_session(&session_id).await?;
    Ok(Json(
        state
            .turn
            .issue_for_session(&session.session_id, &session.user_id),
    ))
}

/// GET `/api/interview/{session_id}/results`
pub async fn get_results(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResults>, AppError> {
    Ok(Json(state.sessions.session_results(&session_id).await?))
}

/// POST `/api/interview/{session_id}/end` — end the session, drop its
/// signaling channel, and hand the finished payload to the workflow
/// service (best-effort).
pub async fn end_interview(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let payload = state.sessions.end_session(&session_id).await?;
    state.signaling.close(&session_id).await;

    match state.workflow.process_interview(payload).await {
        Ok(result) => {
            state.sessions.mark_workflow_processed(&session_id).await?;
            tracing::info!(session_id = %session_id, "interview handed to workflow service");
            tracing::debug!(session_id = %session_id, ?result, "workflow response");
        }
        Err(err) => {
            tracing::warn!(session_id = %session_id, error = %err, "workflow handoff failed");
        }
    }

    Ok(Json(serde_json::json!({
        "status": "completed",
        "message": "Interview session ended successfully",
    })))
}
