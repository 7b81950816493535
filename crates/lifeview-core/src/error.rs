#![forbid(unsafe_code)]

//! Error type shared by every lifeview component.

/// Errors surfaced by calibration, payload ingress, configuration and the
/// channel session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerError {
    /// The drawing surface (canvas element) could not be located.
    SurfaceUnavailable(String),
    /// The surface exists but no 2D context could be obtained from it.
    ContextUnavailable,
    /// Window metrics cannot produce a drawable viewport.
    InvalidViewport(String),
    /// An inbound payload did not match `{ positions: [{x, y}, ...] }`.
    MalformedSnapshot(String),
    /// Configuration failed to parse or validate.
    InvalidConfig(String),
    /// The server rejected the channel join.
    JoinRejected(String),
    /// An operation was attempted in the wrong session state.
    InvalidSessionState {
        expected: &'static str,
        actual: &'static str,
    },
}

impl core::fmt::Display for ViewerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SurfaceUnavailable(id) => write!(f, "canvas element `{id}` not found"),
            Self::ContextUnavailable => f.write_str("2d drawing context unavailable"),
            Self::InvalidViewport(msg) => write!(f, "invalid viewport: {msg}"),
            Self::MalformedSnapshot(msg) => write!(f, "malformed snapshot payload: {msg}"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::JoinRejected(reason) => write!(f, "channel join rejected: {reason}"),
            Self::InvalidSessionState { expected, actual } => {
                write!(f, "session is {actual}, expected {expected}")
            }
        }
    }
}

impl std::error::Error for ViewerError {}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, ViewerError>;
