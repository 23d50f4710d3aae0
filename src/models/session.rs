//! Represents a single voice-interview session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An interview session between a user and the external voice agent.
///
/// The session row carries lifecycle metadata only; transcript entries and
/// detected interests live in their own tables keyed by `id`.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct InterviewSession {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    /// Public session identifier handed to clients
    /// (e.g. `interview_alice_1714070400123`).
    pub session_id: String,

    /// Identifier of the user being interviewed.
    pub user_id: String,

    /// When the session was started.
    pub started_at: DateTime<Utc>,

    /// When the session was ended, if it has been.
    pub ended_at: Option<DateTime<Utc>>,

    /// Current interview stage (`greeting`, `exploration`, `deep_dive`,
    /// `wrap_up`).
    pub stage: String,

    /// Whether the finished session was handed to the workflow service.
    pub workflow_processed: bool,
}

impl InterviewSession {
    /// Seconds elapsed since the session started, up to `ended_at` when set.
    pub fn duration_secs(&self, now: DateTime<Utc>) -> f64 {
        let end = self.ended_at.unwrap_or(now);
        (end - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }
}

/// Interview stage progression. Stored as TEXT in SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStage {
    Greeting,
    Exploration,
    DeepDive,
    WrapUp,
}

impl InterviewStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStage::Greeting => "greeting",
            InterviewStage::Exploration => "exploration",
            InterviewStage::DeepDive => "deep_dive",
            InterviewStage::WrapUp => "wrap_up",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "greeting" => Some(InterviewStage::Greeting),
            "exploration" => Some(InterviewStage::Exploration),
            "deep_dive" => Some(InterviewStage::DeepDive),
            "wrap_up" => Some(InterviewStage::WrapUp),
            _ => None,
        }
    }
}
