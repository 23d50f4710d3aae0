//! Represents an interest detected during an interview.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single interest or hobby surfaced during the conversation.
///
/// Interests are deduplicated per session by name (case-insensitive);
/// the first detection wins.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Interest {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    /// Foreign key linking to the parent session.
    pub session_uuid: Uuid,

    /// Interest name as extracted from the conversation.
    pub name: String,

    /// Optional free-form detail captured alongside the interest.
    pub details: Option<String>,

    /// Detection confidence reported by the voice agent (1.0 for
    /// marker-based extraction).
    pub confidence: f64,

    /// When the interest was first detected.
    pub detected_at: DateTime<Utc>,
}
