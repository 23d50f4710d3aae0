//! Time-limited TURN credential issuance.
//!
//! Implements the coturn `static-auth-secret` REST mechanism: the username
//! is `{expiry_unix}:{user}` and the credential is the base64-encoded
//! HMAC-SHA1 of that username under the shared secret. The relay server
//! recomputes the MAC on allocation, so no state is shared beyond the
//! secret.

use crate::models::signaling::{IceServer, IceServersResponse};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

/// Issues and verifies TURN credentials for a fixed relay host and secret.
#[derive(Clone)]
pub struct TurnService {
    server: String,
    secret: String,
    default_ttl_secs: u64,
}

impl TurnService {
    pub fn new(server: impl Into<String>, secret: impl Into<String>, default_ttl_secs: u64) -> Self {
        Self {
            server: server.into(),
            secret: secret.into(),
            default_ttl_secs,
        }
    }

    fn sign(&self, turn_username: &str) -> String {
        // HMAC-SHA1 accepts keys of any length, so new_from_slice cannot fail.
        let mut mac = HmacSha1::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(turn_username.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Issue credentials for `username` valid for `ttl_secs` (the service
    /// default when `None`).
    pub fn issue(&self, username: &str, ttl_secs: Option<u64>) -> IceServersResponse {
        let ttl = ttl_secs.unwrap_or(self.default_ttl_secs);
        let expiry = Utc::now().timestamp() + ttl as i64;
        let turn_username = format!("{}:{}", expiry, username);
        let credential = self.sign(&turn_username);

        let valid_until = DateTime::<Utc>::from_timestamp(expiry, 0)
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        IceServersResponse {
            ice_servers: vec![
                IceServer {
                    urls: vec![format!("stun:{}:3478", self.server)],
                    username: None,
                    credential: None,
                },
                IceServer {
                    urls: vec![
                        format!("turn:{}:3478?transport=udp", self.server),
                        format!("turn:{}:3478?transport=tcp", self.server),
                        format!("turns:{}:5349?transport=tcp", self.server),
                    ],
                    username: Some(turn_username),
                    credential: Some(credential),
                },
            ],
            valid_until,
        }
    }

    /// Issue credentials scoped to one session, usable until the default TTL.
    pub fn issue_for_session(&self, session_id: &str, user_id: &str) -> IceServersResponse {
        let username = format!("{}_{}", user_id, session_id);
        self.issue(&username, None)
    }

    /// Verify a previously issued credential: not expired and MAC matches.
    /// The comparison is constant-time.
    pub fn verify(&self, turn_username: &str, credential: &str) -> bool {
        let Some((expiry_str, _)) = turn_username.split_once(':') else {
            return false;
        };
        let Ok(expiry) = expiry_str.parse::<i64>() else {
            return false;
        };
        if expiry < Utc::now().timestamp() {
            return false;
        }
        let expected = self.sign(turn_username);
        expected.as_bytes().ct_eq(credential.as_bytes()).into()
    }
}
