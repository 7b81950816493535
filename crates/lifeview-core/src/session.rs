#![forbid(unsafe_code)]

//! Channel session lifecycle.
//!
//! `Disconnected → Connected → Joined`, or `JoinFailed` if the server refuses
//! the join. The socket is connected once at startup and the topic is joined
//! once. Reconnection is left to the transport: it retries failed joins and
//! rejoins after drops on its own, replaying the join reply, so both
//! `JoinFailed → Joined` and a repeated `Joined` are accepted.

use tracing::{debug, error, info};

use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connected,
    Joined,
    JoinFailed,
}

impl SessionState {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Joined => "joined",
            Self::JoinFailed => "join-failed",
        }
    }
}

/// Topic, event names and lifecycle of the single channel the viewer uses.
#[derive(Debug, Clone)]
pub struct ChannelSession {
    topic: String,
    tick_event: String,
    state: SessionState,
    ever_joined: bool,
}

impl ChannelSession {
    #[must_use]
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            topic: config.topic.clone(),
            tick_event: config.tick_event.clone(),
            state: SessionState::Disconnected,
            ever_joined: false,
        }
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn tick_event(&self) -> &str {
        &self.tick_event
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Parameters sent with the join: always an empty object.
    #[must_use]
    pub fn join_params(&self) -> serde_json::Value {
        serde_json::Value::Object(serde_json::Map::new())
    }

    fn expect(&self, expected: SessionState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ViewerError::InvalidSessionState {
                expected: expected.name(),
                actual: self.state.name(),
            })
        }
    }

    /// Socket connect was issued. Fire-and-forget: the join may follow
    /// immediately.
    pub fn connect(&mut self) -> Result<()> {
        self.expect(SessionState::Disconnected)?;
        self.state = SessionState::Connected;
        info!(topic = %self.topic, "socket connecting");
        Ok(())
    }

    /// The server acknowledged the join. Returns `true` only for the first
    /// successful join of the session; later acks are transport rejoins.
    pub fn join_ok(&mut self) -> Result<bool> {
        match self.state {
            SessionState::Joined => {
                debug!(topic = %self.topic, "channel rejoined");
                return Ok(false);
            }
            SessionState::JoinFailed => {
                info!(topic = %self.topic, "channel joined after failed attempt");
            }
            _ => {
                self.expect(SessionState::Connected)?;
                info!(topic = %self.topic, "channel joined");
            }
        }
        self.state = SessionState::Joined;
        let first_join = !self.ever_joined;
        self.ever_joined = true;
        Ok(first_join)
    }

    /// The server refused the join. Logged and returned; retrying is up to the
    /// transport.
    pub fn join_error(&mut self, reason: &str) -> ViewerError {
        self.state = SessionState::JoinFailed;
        error!(topic = %self.topic, reason, "unable to join channel");
        ViewerError::JoinRejected(reason.to_owned())
    }

    /// Whether a server push named `event` should be rendered.
    #[must_use]
    pub fn accepts_push(&self, event: &str) -> bool {
        self.state == SessionState::Joined && event == self.tick_event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn lifecycle_in_order() {
        let mut s = ChannelSession::new(&ViewerConfig::default());
        assert_eq!(s.state(), SessionState::Disconnected);
        assert!(!s.accepts_push("tick"));

        s.connect().unwrap();
        assert!(!s.accepts_push("tick"));
        assert!(s.join_ok().unwrap());
        assert_eq!(s.state(), SessionState::Joined);
        assert!(!s.join_ok().unwrap(), "replayed reply is a rejoin");
        assert!(s.accepts_push("tick"));
        assert!(!s.accepts_push("presence_diff"));
        assert_eq!(s.join_params(), serde_json::json!({}));
    }

    #[test]
    fn join_before_connect_is_rejected() {
        let mut s = ChannelSession::new(&ViewerConfig::default());
        assert_eq!(
            s.join_ok().unwrap_err(),
            ViewerError::InvalidSessionState {
                expected: "connected",
                actual: "disconnected"
            }
        );
    }

    #[test]
    fn double_connect_is_rejected() {
        let mut s = ChannelSession::new(&ViewerConfig::default());
        s.connect().unwrap();
        assert!(s.connect().is_err());
    }

    #[test]
    fn join_error_stops_pushes_until_transport_retry_succeeds() {
        let mut s = ChannelSession::new(&ViewerConfig::default());
        s.connect().unwrap();
        let err = s.join_error("unmatched topic");
        assert_eq!(err, ViewerError::JoinRejected("unmatched topic".into()));
        assert_eq!(s.state(), SessionState::JoinFailed);
        assert!(!s.accepts_push("tick"));

        assert!(s.join_ok().unwrap(), "first successful join");
        assert_eq!(s.state(), SessionState::Joined);
        assert!(s.accepts_push("tick"));
    }

    #[test]
    fn recovery_after_a_lost_join_is_not_a_first_join() {
        let mut s = ChannelSession::new(&ViewerConfig::default());
        s.connect().unwrap();
        assert!(s.join_ok().unwrap());
        s.join_error("timeout");
        assert!(!s.accepts_push("tick"));
        assert!(!s.join_ok().unwrap());
        assert!(s.accepts_push("tick"));
    }
}
