//! Lobby Player Core
//!
//! Shared types, traits, and error handling for Lobby Player.
//!
//! This crate provides the building blocks that the playback engine and its
//! hosts agree on:
//! - **Domain Types**: `TransportState`, `Track`, `UserId`, `TrackId`, `SessionId`
//! - **Wire Intent**: `TransportIntent`, the event contract of the lobby channel
//! - **Collaborator Traits**: `TransportChannel`, `LikedTracksStore`, `PlayLogService`
//! - **Error Handling**: Unified `LobbyError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use lobby_core::types::{PlayState, Track, TrackId, TransportIntent, TransportState};
//!
//! let mut state = TransportState::default();
//! assert!(state.track_id.is_none());
//!
//! let track = Track::new(TrackId::new("track-1"), "Song", "Artist");
//! state.apply_intent(&TransportIntent::ChangeMusic(track));
//! state.apply_intent(&TransportIntent::Play);
//!
//! assert_eq!(state.track_id, Some(TrackId::new("track-1")));
//! assert_eq!(state.effective_play_state(), PlayState::Playing);
//! ```

pub mod error;
pub mod traits;
pub mod types;

pub use error::{LobbyError, Result};
pub use traits::{LikedTracksStore, PlayLogService, TransportChannel};
