//! In-memory WebRTC signaling relay.
//!
//! Each active session owns one signaling channel: a single offer/answer
//! slot plus one ICE candidate mailbox per direction. Peers poll over REST,
//! so candidates are queued until the opposite role drains them. Channels
//! live only while the session is active; ending the session drops the
//! channel and any queued state.

use crate::models::signaling::{IceCandidate, SessionDescription};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("no signaling channel for session `{0}`")]
    ChannelNotFound(String),
    #[error("no pending offer for session `{0}`")]
    NoPendingOffer(String),
    #[error("invalid signaling role `{0}`, expected `caller` or `callee`")]
    InvalidRole(String),
}

pub type SignalingResult<T> = Result<T, SignalingError>;

/// Which side of the connection a signaling message belongs to.
///
/// The browser initiating the call is the caller; the media peer answering
/// it is the callee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    Caller,
    Callee,
}

impl PeerRole {
    pub fn parse(value: &str) -> SignalingResult<Self> {
        match value {
            "caller" => Ok(PeerRole::Caller),
            "callee" => Ok(PeerRole::Callee),
            other => Err(SignalingError::InvalidRole(other.to_string())),
        }
    }

    fn opposite(self) -> Self {
        match self {
            PeerRole::Caller => PeerRole::Callee,
            PeerRole::Callee => PeerRole::Caller,
        }
    }
}

#[derive(Debug, Default)]
struct SignalingChannel {
    offer: Option<SessionDescription>,
    answer: Option<SessionDescription>,
    // Candidates waiting to be drained, keyed by the role that will read them.
    for_caller: Vec<IceCandidate>,
    for_callee: Vec<IceCandidate>,
}

/// Registry of signaling channels for all active sessions.
#[derive(Clone, Default)]
pub struct SignalingService {
    channels: Arc<RwLock<HashMap<String, SignalingChannel>>>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a channel when a session starts. Idempotent.
    pub async fn open(&self, session_id: &str) {
        self.channels
            .write()
            .await
            .entry(session_id.to_string())
            .or_default();
    }

    /// Drop the channel and all queued state when a session ends.
    pub async fn close(&self, session_id: &str) {
        self.channels.write().await.remove(session_id);
    }

    /// Store the caller's offer. Re-posting replaces the previous offer and
    /// clears any stale answer (renegotiation).
    pub async fn put_offer(
        &self,
        session_id: &str,
        offer: SessionDescription,
    ) -> SignalingResult<()> {
        let mut channels = self.channels.write().await;
        let channel = channels
            .get_mut(session_id)
            .ok_or_else(|| SignalingError::ChannelNotFound(session_id.to_string()))?;
        channel.offer = Some(offer);
        channel.answer = None;
        Ok(())
    }

    /// Fetch the pending offer without consuming it, so the callee can
    /// retry safely.
    pub async fn get_offer(&self, session_id: &str) -> SignalingResult<Option<SessionDescription>> {
        let channels = self.channels.read().await;
        let channel = channels
            .get(session_id)
            .ok_or_else(|| SignalingError::ChannelNotFound(session_id.to_string()))?;
        Ok(channel.offer.clone())
    }

    /// Store the callee's answer. Requires a pending offer.
    pub async fn put_answer(
        &self,
        session_id: &str,
        answer: SessionDescription,
    ) -> SignalingResult<()> {
        let mut channels = self.channels.write().await;
        let channel = channels
            .get_mut(session_id)
            .ok_or_else(|| SignalingError::ChannelNotFound(session_id.to_string()))?;
        if channel.offer.is_none() {
            return Err(SignalingError::NoPendingOffer(session_id.to_string()));
        }
        channel.answer = Some(answer);
        Ok(())
    }

    /// Poll for the answer. Returns `None` until the callee posts one.
    pub async fn get_answer(
        &self,
        session_id: &str,
    ) -> SignalingResult<Option<SessionDescription>> {
        let channels = self.channels.read().await;
        let channel = channels
            .get(session_id)
            .ok_or_else(|| SignalingError::ChannelNotFound(session_id.to_string()))?;
        Ok(channel.answer.clone())
    }

    /// Queue a candidate from `from` for the opposite role to drain.
    pub async fn push_candidate(
        &self,
        session_id: &str,
        from: PeerRole,
        candidate: IceCandidate,
    ) -> SignalingResult<()> {
        let mut channels = self.channels.write().await;
        let channel = channels
            .get_mut(session_id)
            .ok_or_else(|| SignalingError::ChannelNotFound(session_id.to_string()))?;
        match from.opposite() {
            PeerRole::Caller => channel.for_caller.push(candidate),
            PeerRole::Callee => channel.for_callee.push(candidate),
        }
        Ok(())
    }

    /// Return and clear all candidates queued for `role`.
    pub async fn drain_candidates(
        &self,
        session_id: &str,
        role: PeerRole,
    ) -> SignalingResult<Vec<IceCandidate>> {
        let mut channels = self.channels.write().await;
        let channel = channels
            .get_mut(session_id)
            .ok_or_else(|| SignalingError::ChannelNotFound(session_id.to_string()))?;
        let queue = match role {
            PeerRole::Caller => &mut channel.for_caller,
            PeerRole::Callee => &mut channel.for_callee,
        };
        Ok(std::mem::take(queue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sdp(kind: &str, body: &str) -> SessionDescription {
        SessionDescription {
            sdp_type: kind.to_string(),
            sdp: body.to_string(),
        }
    }

    fn candidate(tag: &str) -> IceCandidate {
        IceCandidate {
            candidate: format!("candidate:{}", tag),
            sdp_mid: Some("0".to_string()),
            sdp_mline_index: Some(0),
        }
    }

    #[tokio::test]
    async fn offer_answer_roundtrip() {
        let svc = SignalingService::new();
        svc.open("s1").await;

        assert!(svc.get_offer("s1").await.unwrap().is_none());
        svc.put_offer("s1", sdp("offer", "v=0 caller")).await.unwrap();
        assert_eq!(
            svc.get_offer("s1").await.unwrap().unwrap().sdp,
            "v=0 caller"
        );

        assert!(svc.get_answer("s1").await.unwrap().is_none());
        svc.put_answer("s1", sdp("answer", "v=0 callee"))
            .await
            .unwrap();
        assert_eq!(
            svc.get_answer("s1").await.unwrap().unwrap().sdp,
            "v=0 callee"
        );
    }

    #[tokio::test]
    async fn answer_requires_offer() {
        let svc = SignalingService::new();
        svc.open("s1").await;
        let err = svc.put_answer("s1", sdp("answer", "x")).await.unwrap_err();
        assert!(matches!(err, SignalingError::NoPendingOffer(_)));
    }

    #[tokio::test]
    async fn reoffer_clears_stale_answer() {
        let svc = SignalingService::new();
        svc.open("s1").await;
        svc.put_offer("s1", sdp("offer", "one")).await.unwrap();
        svc.put_answer("s1", sdp("answer", "one")).await.unwrap();
        svc.put_offer("s1", sdp("offer", "two")).await.unwrap();
        assert!(svc.get_answer("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn candidates_route_to_opposite_role() {
        let svc = SignalingService::new();
        svc.open("s1").await;

        svc.push_candidate("s1", PeerRole::Caller, candidate("a"))
            .await
            .unwrap();
        svc.push_candidate("s1", PeerRole::Callee, candidate("b"))
            .await
            .unwrap();

        let for_callee = svc.drain_candidates("s1", PeerRole::Callee).await.unwrap();
        assert_eq!(for_callee.len(), 1);
        assert_eq!(for_callee[0].candidate, "candidate:a");

        let for_caller = svc.drain_candidates("s1", PeerRole::Caller).await.unwrap();
        assert_eq!(for_caller.len(), 1);
        assert_eq!(for_caller[0].candidate, "candidate:b");

        // Drained mailboxes stay empty.
        assert!(
            svc.drain_candidates("s1", PeerRole::Caller)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn closed_channel_rejects_everything() {
        let svc = SignalingService::new();
        svc.open("s1").await;
        svc.close("s1").await;
        let err = svc.put_offer("s1", sdp("offer", "x")).await.unwrap_err();
        assert!(matches!(err, SignalingError::ChannelNotFound(_)));
    }

    #[test]
    fn role_parsing() {
        assert_eq!(PeerRole::parse("caller").unwrap(), PeerRole::Caller);
        assert_eq!(PeerRole::parse("callee").unwrap(), PeerRole::Callee);
        assert!(matches!(
            PeerRole::parse("observer"),
            Err(SignalingError::InvalidRole(_))
        ));
    }
}
