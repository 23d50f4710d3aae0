//! Represents transcript fragments posted by the voice agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Who produced a transcript fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Assistant => "assistant",
        }
    }
}

/// One utterance of the conversation, in arrival order.
///
/// Assistant entries are stored with `[INTEREST: …]` markers already
/// stripped; the markers only drive interest extraction.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct TranscriptEntry {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    /// Foreign key linking to the parent session.
    pub session_uuid: Uuid,

    /// `user` or `assistant`. TEXT in SQLite.
    pub speaker: String,

    /// The spoken text.
    pub text: String,

    /// When the fragment was received.
    pub recorded_at: DateTime<Utc>,
}
