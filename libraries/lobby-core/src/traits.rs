/// Collaborator traits for Lobby Player
///
/// The playback engine never talks to a socket, database or HTTP API
/// directly. Hosts implement these traits and hand them to the session.
use crate::error::Result;
use crate::types::{TrackId, TransportIntent, UserId};
use async_trait::async_trait;

/// Lobby-wide transport channel
///
/// Implementers forward intents to the shared state store of the lobby.
/// The engine treats every call as fire-and-forget: a failure is reported,
/// never rolled back.
#[async_trait]
pub trait TransportChannel: Send + Sync {
    /// Propagate an accepted intent to the other lobby members
    ///
    /// # Errors
    /// Returns an error if the intent could not be handed to the channel
    async fn update_state(&self, intent: TransportIntent) -> Result<()>;
}

/// Per-user liked tracks store
///
/// Holds the authoritative liked flag for each `(user, track)` pair.
#[async_trait]
pub trait LikedTracksStore: Send + Sync {
    /// Check whether the user likes the track
    async fn is_liked(&self, user_id: &UserId, track_id: &TrackId) -> Result<bool>;

    /// Persist the liked flag for the user and track
    async fn set_liked(&self, user_id: &UserId, track_id: &TrackId, liked: bool) -> Result<()>;
}

/// Play history service
#[async_trait]
pub trait PlayLogService: Send + Sync {
    /// Record that the user started listening to the track
    ///
    /// Delivery may be duplicated; implementers must tolerate at-least-once writes.
    async fn record_play(&self, user_id: &UserId, track_id: &TrackId) -> Result<()>;
}
