//! Error types for the playback engine

use thiserror::Error;

/// Why the transport machine refused an intent
///
/// Rejections are silent from the user's point of view: state stays as it
/// was and nothing is propagated. They are returned so hosts and tests can
/// tell an ignored click from an applied one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The session does not grant transport control to this client
    #[error("Controls are disabled for this session")]
    ControlsDisabled,

    /// A play transition has not settled yet
    #[error("Transport is loading")]
    Loading,

    /// The intent needs a loaded track
    #[error("No track loaded")]
    NoTrack,

    /// Play requested while already playing
    #[error("Already playing")]
    AlreadyPlaying,

    /// Pause requested while not playing
    #[error("Not playing")]
    NotPlaying,
}

/// Playback engine errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The session has been closed
    #[error("Session closed")]
    SessionClosed,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
