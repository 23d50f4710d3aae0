//! Core data models for the voice-interview session service.
//!
//! These entities represent sessions, detected interests, and transcript
//! entries. They map cleanly to database tables via `sqlx::FromRow` and
//! serialize naturally as JSON via `serde`. Signaling types are wire-only
//! and never persisted.

pub mod interest;
pub mod session;
pub mod signaling;
pub mod transcript;
