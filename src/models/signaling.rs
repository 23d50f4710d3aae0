//! Wire types for WebRTC signaling and ICE server configuration.
//!
//! These are exchanged over the REST signaling endpoints and never touch
//! the database. Field names follow the browser-side RTCPeerConnection
//! conventions so frontends can pass payloads through unchanged.

use serde::{Deserialize, Serialize};

/// An SDP offer or answer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SessionDescription {
    /// `offer` or `answer`.
    #[serde(rename = "type")]
    pub sdp_type: String,

    /// The raw SDP payload.
    pub sdp: String,
}

/// A trickled ICE candidate.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IceCandidate {
    pub candidate: String,

    #[serde(rename = "sdpMid")]
    pub sdp_mid: Option<String>,

    #[serde(rename = "sdpMLineIndex")]
    pub sdp_mline_index: Option<u32>,
}

/// One entry of an `iceServers` configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct IceServer {
    pub urls: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// ICE server configuration returned to clients, including time-limited
/// TURN credentials.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct IceServersResponse {
    #[serde(rename = "iceServers")]
    pub ice_servers: Vec<IceServer>,

    /// RFC 3339 timestamp after which the TURN credentials stop working.
    #[serde(rename = "validUntil")]
    pub valid_until: String,
}
