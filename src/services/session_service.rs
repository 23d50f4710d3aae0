//! src/services/session_service.rs
//!
//! SessionService — interview session lifecycle backed by SQLite. Session
//! rows, transcript entries, and detected interests are durable; the
//! signaling side lives in `signaling_service` and is dropped when a
//! session ends. This file owns all SQL for the service.

use crate::models::{
    interest::Interest,
    session::{InterviewSession, InterviewStage},
    transcript::{Speaker, TranscriptEntry},
};
use crate::services::analysis::{
    self, ConversationAnalysis, extract_interest_markers, strip_interest_markers,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

const MAX_USER_ID_LEN: usize = 64;
const MAX_TRANSCRIPT_TEXT_LEN: usize = 8 * 1024;

/// Greeting line surfaced through the status endpoint so frontends can
/// display it before audio is up.
pub const GREETING: &str = "Hi! I'm here to learn about your interests and hobbies. \
Let's have a conversation about what you enjoy doing!";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session `{0}` not found")]
    SessionNotFound(String),
    #[error("session `{0}` has already ended")]
    SessionEnded(String),
    #[error("user id `{user_id}` invalid: {reason}")]
    InvalidUserId { user_id: String, reason: String },
    #[error("invalid transcript payload: {0}")]
    InvalidTranscript(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Snapshot returned by the status endpoint.
#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub status: String,
    pub started_at: String,
    pub stage: String,
    pub interests_detected: i64,
    pub transcript_entries: i64,
    pub greeting: &'static str,
}

/// Full result set for a session, served after (or during) the interview.
#[derive(Debug, Serialize)]
pub struct SessionResults {
    pub session_id: String,
    pub user_id: String,
    pub title: String,
    pub stage: String,
    pub duration: f64,
    pub interests: Vec<Interest>,
    pub analysis: ConversationAnalysis,
    pub workflow_processed: bool,
}

/// SessionService provides the interview session operations:
/// - Start a session (insert row, stage `greeting`)
/// - Append transcript fragments (extracting `[INTEREST: …]` markers)
/// - Record interests (deduplicated per session)
/// - Report status, results, and the workflow handoff payload
/// - End a session (terminal; later mutations are rejected)
#[derive(Clone)]
pub struct SessionService {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
}

impl SessionService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Validate a user id: non-empty, bounded, `[A-Za-z0-9_-]` only.
    /// The id is embedded in session identifiers and TURN usernames, so
    /// the charset is kept deliberately narrow.
    fn ensure_user_id_safe(&self, user_id: &str) -> SessionResult<()> {
        if user_id.is_empty() {
            return Err(SessionError::InvalidUserId {
                user_id: user_id.to_string(),
                reason: "must not be empty".into(),
            });
        }
        if user_id.len() > MAX_USER_ID_LEN {
            return Err(SessionError::InvalidUserId {
                user_id: user_id.to_string(),
                reason: format!("must be at most {} characters", MAX_USER_ID_LEN),
            });
        }
        if !user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(SessionError::InvalidUserId {
                user_id: user_id.to_string(),
                reason: "allowed characters are letters, digits, underscore, and hyphen".into(),
            });
        }
        Ok(())
    }

    /// Start a new session for `user_id`.
    pub async fn start_session(&self, user_id: &str) -> SessionResult<InterviewSession> {
        self.ensure_user_id_safe(user_id)?;

        let now = Utc::now();
        let session = InterviewSession {
            id: Uuid::new_v4(),
            session_id: format!("interview_{}_{}", user_id, now.timestamp_millis()),
            user_id: user_id.to_string(),
            started_at: now,
            ended_at: None,
            stage: InterviewStage::Greeting.as_str().to_string(),
            workflow_processed: false,
        };

        sqlx::query(
            "INSERT INTO sessions (id, session_id, user_id, started_at, ended_at, stage, workflow_processed)
             VALUES (?, ?, ?, ?, NULL, ?, 0)",
        )
        .bind(session.id)
        .bind(&session.session_id)
        .bind(&session.user_id)
        .bind(session.started_at)
        .bind(&session.stage)
        .execute(&*self.db)
        .await?;

        Ok(session)
    }

    /// Fetch a session by its public identifier.
    ///
    /// Returns SessionNotFound if missing.
    pub async fn fetch_session(&self, session_id: &str) -> SessionResult<InterviewSession> {
        sqlx::query_as::<_, InterviewSession>(
            "SELECT id, session_id, user_id, started_at, ended_at, stage, workflow_processed
             FROM sessions WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => SessionError::SessionNotFound(session_id.to_string()),
            other => SessionError::Sqlx(other),
        })
    }

    async fn transcript_count(&self, session: &InterviewSession) -> SessionResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM transcript_entries WHERE session_uuid = ?",
        )
        .bind(session.id)
        .fetch_one(&*self.db)
        .await?)
    }

    async fn interest_count(&self, session: &InterviewSession) -> SessionResult<i64> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM interests WHERE session_uuid = ?")
                .bind(session.id)
                .fetch_one(&*self.db)
                .await?,
        )
    }

    /// Fetch the transcript in arrival order.
    pub async fn transcript(&self, session: &InterviewSession) -> SessionResult<Vec<TranscriptEntry>> {
        Ok(sqlx::query_as::<_, TranscriptEntry>(
            "SELECT id, session_uuid, speaker, text, recorded_at
             FROM transcript_entries WHERE session_uuid = ? ORDER BY recorded_at ASC, id ASC",
        )
        .bind(session.id)
        .fetch_all(&*self.db)
        .await?)
    }

    /// Fetch detected interests in detection order.
    pub async fn interests(&self, session: &InterviewSession) -> SessionResult<Vec<Interest>> {
        Ok(sqlx::query_as::<_, Interest>(
            "SELECT id, session_uuid, name, details, confidence, detected_at
             FROM interests WHERE session_uuid = ? ORDER BY detected_at ASC, id ASC",
        )
        .bind(session.id)
        .fetch_all(&*self.db)
        .await?)
    }

    /// Record an interest unless one with the same name (case-insensitive)
    /// already exists for the session. Returns true when a row was added.
    pub async fn record_interest(
        &self,
        session: &InterviewSession,
        name: &str,
        details: Option<&str>,
        confidence: f64,
    ) -> SessionResult<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::InvalidTranscript(
                "interest name must not be empty".into(),
            ));
        }

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM interests WHERE session_uuid = ? AND lower(name) = lower(?)",
        )
        .bind(session.id)
        .bind(name)
        .fetch_one(&*self.db)
        .await?;
        if existing > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO interests (id, session_uuid, name, details, confidence, detected_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(session_uuid, name) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(session.id)
        .bind(name)
        .bind(details)
        .bind(confidence)
        .bind(Utc::now())
        .execute(&*self.db)
        .await?;

        tracing::info!(session_id = %session.session_id, interest = name, "new interest detected");
        Ok(true)
    }

    /// Append a transcript fragment.
    ///
    /// Assistant fragments are scanned for `[INTEREST: …]` markers; each
    /// new interest is recorded and the markers are stripped before the
    /// text is stored. The interview stage is re-derived afterwards.
    pub async fn append_transcript(
        &self,
        session_id: &str,
        speaker: Speaker,
        text: &str,
    ) -> SessionResult<TranscriptEntry> {
        let session = self.fetch_session(session_id).await?;
        if session.is_ended() {
            return Err(SessionError::SessionEnded(session_id.to_string()));
        }
        if text.trim().is_empty() {
            return Err(SessionError::InvalidTranscript(
                "transcript text must not be empty".into(),
            ));
        }
        if text.len() > MAX_TRANSCRIPT_TEXT_LEN {
            return Err(SessionError::InvalidTranscript(format!(
                "transcript text exceeds {} bytes",
                MAX_TRANSCRIPT_TEXT_LEN
            )));
        }

        let stored_text = match speaker {
            Speaker::Assistant => {
                for interest in extract_interest_markers(text) {
                    self.record_interest(&session, &interest, None, 1.0).await?;
                }
                strip_interest_markers(text)
            }
            Speaker::User => text.trim().to_string(),
        };

        let entry = TranscriptEntry {
            id: Uuid::new_v4(),
            session_uuid: session.id,
            speaker: speaker.as_str().to_string(),
            text: stored_text,
            recorded_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO transcript_entries (id, session_uuid, speaker, text, recorded_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(entry.id)
        .bind(entry.session_uuid)
        .bind(&entry.speaker)
        .bind(&entry.text)
        .bind(entry.recorded_at)
        .execute(&*self.db)
        .await?;

        self.refresh_stage(&session).await?;

        Ok(entry)
    }

    /// Re-derive the interview stage from message and interest counts and
    /// persist it when it advances. Stages never regress.
    async fn refresh_stage(&self, session: &InterviewSession) -> SessionResult<InterviewStage> {
        let messages = self.transcript_count(session).await?;
        let interests = self.interest_count(session).await?;
        let current =
            InterviewStage::parse(&session.stage).unwrap_or(InterviewStage::Greeting);
        let derived = derive_stage(messages, interests);
        let next = current.max(derived);

        if next != current {
            sqlx::query("UPDATE sessions SET stage = ? WHERE id = ?")
                .bind(next.as_str())
                .bind(session.id)
                .execute(&*self.db)
                .await?;
            tracing::debug!(
                session_id = %session.session_id,
                from = current.as_str(),
                to = next.as_str(),
                "interview stage advanced"
            );
        }
        Ok(next)
    }

    /// Status snapshot for the polling frontend.
    pub async fn session_status(&self, session_id: &str) -> SessionResult<SessionStatus> {
        let session = self.fetch_session(session_id).await?;
        let transcript_entries = self.transcript_count(&session).await?;
        let interests_detected = self.interest_count(&session).await?;

        Ok(SessionStatus {
            session_id: session.session_id.clone(),
            status: if session.is_ended() {
                "ended".into()
            } else {
                "active".into()
            },
            started_at: session.started_at.to_rfc3339(),
            stage: session.stage.clone(),
            interests_detected,
            transcript_entries,
            greeting: GREETING,
        })
    }

    /// Interests, duration, title, and conversation analysis for a session.
    pub async fn session_results(&self, session_id: &str) -> SessionResult<SessionResults> {
        let session = self.fetch_session(session_id).await?;
        let interests = self.interests(&session).await?;
        let transcript = self.transcript(&session).await?;

        Ok(SessionResults {
            session_id: session.session_id.clone(),
            user_id: session.user_id.clone(),
            title: analysis::generate_title(&transcript),
            stage: session.stage.clone(),
            duration: session.duration_secs(Utc::now()),
            interests,
            analysis: analysis::analyze_conversation(&transcript),
            workflow_processed: session.workflow_processed,
        })
    }

    /// End a session. Terminal: a second call fails with SessionEnded.
    ///
    /// Returns the handoff payload for the workflow service, shaped like
    /// the live results plus the full transcript.
    pub async fn end_session(&self, session_id: &str) -> SessionResult<serde_json::Value> {
        let session = self.fetch_session(session_id).await?;
        if session.is_ended() {
            return Err(SessionError::SessionEnded(session_id.to_string()));
        }

        let ended_at = Utc::now();
        sqlx::query("UPDATE sessions SET ended_at = ? WHERE id = ? AND ended_at IS NULL")
            .bind(ended_at)
            .bind(session.id)
            .execute(&*self.db)
            .await?;

        let interests = self.interests(&session).await?;
        let transcript = self.transcript(&session).await?;
        let duration = (ended_at - session.started_at).num_milliseconds() as f64 / 1000.0;

        Ok(json!({
            "session_id": session.session_id,
            "user_id": session.user_id,
            "interests": interests
                .iter()
                .map(|i| json!({
                    "name": i.name,
                    "details": i.details,
                    "detected_at": i.detected_at.to_rfc3339(),
                }))
                .collect::<Vec<_>>(),
            "transcript": transcript
                .iter()
                .map(|e| json!({
                    "speaker": e.speaker,
                    "text": e.text,
                    "timestamp": e.recorded_at.to_rfc3339(),
                }))
                .collect::<Vec<_>>(),
            "duration": duration,
        }))
    }

    /// Flag that the workflow handoff for this session succeeded.
    pub async fn mark_workflow_processed(&self, session_id: &str) -> SessionResult<()> {
        sqlx::query("UPDATE sessions SET workflow_processed = 1 WHERE session_id = ?")
            .bind(session_id)
            .execute(&*self.db)
            .await?;
        Ok(())
    }

    /// Count of sessions that have not ended yet.
    pub async fn active_session_count(&self) -> SessionResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sessions WHERE ended_at IS NULL",
        )
        .fetch_one(&*self.db)
        .await?)
    }
}

/// Stage implied by raw counts, ignoring the current stage.
///
/// Thresholds follow the interview orchestration of the original agent:
/// greeting until more than 2 messages, exploration until at least 2
/// interests and more than 6 messages, deep dive until more than 12.
fn derive_stage(message_count: i64, interest_count: i64) -> InterviewStage {
    let mut stage = InterviewStage::Greeting;
    if message_count > 2 {
        stage = InterviewStage::Exploration;
    }
    if stage == InterviewStage::Exploration && interest_count >= 2 && message_count > 6 {
        stage = InterviewStage::DeepDive;
    }
    if stage == InterviewStage::DeepDive && message_count > 12 {
        stage = InterviewStage::WrapUp;
    }
    stage
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    /// In-memory pool with the real schema applied.
    pub(crate) async fn test_pool() -> Arc<SqlitePool> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        let schema = include_str!("../../migrations/0001_init.sql");
        for stmt in schema.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(stmt).execute(&pool).await.expect("migration statement");
        }
        Arc::new(pool)
    }

    async fn service() -> SessionService {
        SessionService::new(test_pool().await)
    }

    #[tokio::test]
    async fn start_and_fetch_session() {
        let svc = service().await;
        let session = svc.start_session("alice").await.unwrap();
        assert!(session.session_id.starts_with("interview_alice_"));
        assert_eq!(session.stage, "greeting");

        let fetched = svc.fetch_session(&session.session_id).await.unwrap();
        assert_eq!(fetched.id, session.id);
        assert_eq!(fetched.user_id, "alice");
        assert!(fetched.ended_at.is_none());
    }

    #[tokio::test]
    async fn rejects_bad_user_ids() {
        let svc = service().await;
        assert!(matches!(
            svc.start_session("").await,
            Err(SessionError::InvalidUserId { .. })
        ));
        assert!(matches!(
            svc.start_session("alice/../etc").await,
            Err(SessionError::InvalidUserId { .. })
        ));
        let long = "a".repeat(65);
        assert!(matches!(
            svc.start_session(&long).await,
            Err(SessionError::InvalidUserId { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let svc = service().await;
        assert!(matches!(
            svc.fetch_session("interview_nobody_0").await,
            Err(SessionError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn assistant_transcript_extracts_interests_and_strips_markers() {
        let svc = service().await;
        let session = svc.start_session("alice").await.unwrap();

        let entry = svc
            .append_transcript(
                &session.session_id,
                Speaker::Assistant,
                "Nice! [INTEREST: astronomy] Tell me more about the stars.",
            )
            .await
            .unwrap();
        assert_eq!(entry.text, "Nice! Tell me more about the stars.");

        let interests = svc.interests(&session).await.unwrap();
        assert_eq!(interests.len(), 1);
        assert_eq!(interests[0].name, "astronomy");
    }

    #[tokio::test]
    async fn interests_dedup_case_insensitively() {
        let svc = service().await;
        let session = svc.start_session("alice").await.unwrap();

        assert!(svc.record_interest(&session, "Chess", None, 1.0).await.unwrap());
        assert!(!svc.record_interest(&session, "chess", None, 1.0).await.unwrap());
        assert_eq!(svc.interests(&session).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn transcript_rejected_after_end() {
        let svc = service().await;
        let session = svc.start_session("alice").await.unwrap();
        svc.end_session(&session.session_id).await.unwrap();

        let err = svc
            .append_transcript(&session.session_id, Speaker::User, "hello?")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::SessionEnded(_)));
    }

    #[tokio::test]
    async fn end_is_terminal_but_results_survive() {
        let svc = service().await;
        let session = svc.start_session("alice").await.unwrap();
        svc.append_transcript(&session.session_id, Speaker::User, "I love calculus")
            .await
            .unwrap();

        let payload = svc.end_session(&session.session_id).await.unwrap();
        assert_eq!(payload["user_id"], "alice");
        assert_eq!(payload["transcript"].as_array().unwrap().len(), 1);

        assert!(matches!(
            svc.end_session(&session.session_id).await,
            Err(SessionError::SessionEnded(_))
        ));

        let results = svc.session_results(&session.session_id).await.unwrap();
        assert_eq!(results.title, "I love calculus");
        assert!(results.analysis.subjects.contains(&"Mathematics".to_string()));

        let status = svc.session_status(&session.session_id).await.unwrap();
        assert_eq!(status.status, "ended");
    }

    #[tokio::test]
    async fn stage_advances_with_conversation() {
        let svc = service().await;
        let session = svc.start_session("alice").await.unwrap();

        // Two messages: still greeting.
        for text in ["hi", "hello there"] {
            svc.append_transcript(&session.session_id, Speaker::User, text)
                .await
                .unwrap();
        }
        assert_eq!(
            svc.fetch_session(&session.session_id).await.unwrap().stage,
            "greeting"
        );

        // Third message crosses into exploration.
        svc.append_transcript(&session.session_id, Speaker::User, "I like stuff")
            .await
            .unwrap();
        assert_eq!(
            svc.fetch_session(&session.session_id).await.unwrap().stage,
            "exploration"
        );

        // Two interests and more than six messages: deep dive.
        svc.append_transcript(
            &session.session_id,
            Speaker::Assistant,
            "Great! [INTEREST: chess] [INTEREST: piano]",
        )
        .await
        .unwrap();
        for text in ["yes", "mostly chess", "openings"] {
            svc.append_transcript(&session.session_id, Speaker::User, text)
                .await
                .unwrap();
        }
        assert_eq!(
            svc.fetch_session(&session.session_id).await.unwrap().stage,
            "deep_dive"
        );

        // Past twelve messages: wrap up.
        for i in 0..6 {
            svc.append_transcript(&session.session_id, Speaker::User, &format!("more {}", i))
                .await
                .unwrap();
        }
        assert_eq!(
            svc.fetch_session(&session.session_id).await.unwrap().stage,
            "wrap_up"
        );
    }

    #[tokio::test]
    async fn active_session_count_tracks_lifecycle() {
        let svc = service().await;
        let a = svc.start_session("alice").await.unwrap();
        let _b = svc.start_session("bob").await.unwrap();
        assert_eq!(svc.active_session_count().await.unwrap(), 2);
        svc.end_session(&a.session_id).await.unwrap();
        assert_eq!(svc.active_session_count().await.unwrap(), 1);
    }

    #[test]
    fn derive_stage_thresholds() {
        assert_eq!(derive_stage(0, 0), InterviewStage::Greeting);
        assert_eq!(derive_stage(2, 5), InterviewStage::Greeting);
        assert_eq!(derive_stage(3, 0), InterviewStage::Exploration);
        assert_eq!(derive_stage(7, 1), InterviewStage::Exploration);
        assert_eq!(derive_stage(7, 2), InterviewStage::DeepDive);
        assert_eq!(derive_stage(13, 2), InterviewStage::WrapUp);
        // Lots of messages but no interests never reaches deep dive.
        assert_eq!(derive_stage(20, 0), InterviewStage::Exploration);
    }
}
