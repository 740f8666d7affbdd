/// Core error types for Lobby Player
use thiserror::Error;

/// Result type alias using `LobbyError`
pub type Result<T> = std::result::Result<T, LobbyError>;

/// Errors reported by the session's external collaborators
#[derive(Error, Debug)]
pub enum LobbyError {
    /// Liked-tracks store read or write failed
    #[error("Liked store error: {0}")]
    LikedStore(String),

    /// Lobby transport channel failed to accept an intent
    #[error("Transport channel error: {0}")]
    Channel(String),

    /// Play-log service rejected or lost a write
    #[error("Play log error: {0}")]
    PlayLog(String),
}

impl LobbyError {
    /// Create a liked-store error
    pub fn liked_store(msg: impl Into<String>) -> Self {
        Self::LikedStore(msg.into())
    }

    /// Create a transport channel error
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    /// Create a play-log error
    pub fn play_log(msg: impl Into<String>) -> Self {
        Self::PlayLog(msg.into())
    }
}
