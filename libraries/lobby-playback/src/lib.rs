//! Lobby Player - Playback State Synchronization
//!
//! Keeps one client's view of a shared listening session ("lobby") in step
//! with everyone else's.
//!
//! This crate provides:
//! - Transport state machine (play, pause, seek, volume, track change, next)
//! - Volume control with mute memory
//! - Seek slider mapping
//! - FIFO queue of upcoming tracks
//! - Optimistic liked-state cache with stale-result guards
//! - Play-log emission on track identity changes
//! - `LobbySession`, an actor that wires all of the above to the lobby
//!
//! # Architecture
//!
//! `lobby-playback` never touches a socket, database or HTTP API. The lobby
//! channel, liked store and play log are supplied through the traits in
//! `lobby-core`. In-memory versions live in [`memory`].
//!
//! Local intents update state optimistically and are then propagated.
//! Whole-state broadcasts from the lobby replace local state (last writer
//! wins).
//!
//! # Example
//!
//! ```rust
//! use lobby_core::types::{Track, TrackId, UserId};
//! use lobby_playback::memory::{InMemoryLikedStore, InMemoryPlayLog, LoopbackChannel};
//! use lobby_playback::{Collaborators, LobbySession, Phase, SessionConfig};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> lobby_playback::Result<()> {
//! let collaborators = Collaborators {
//!     channel: Arc::new(LoopbackChannel::default()),
//!     liked_store: Arc::new(InMemoryLikedStore::new()),
//!     play_log: Arc::new(InMemoryPlayLog::new()),
//! };
//! let (mut session, _diagnostics) =
//!     LobbySession::new(SessionConfig::default(), Some(UserId::new("me")), collaborators)?;
//!
//! session.change_music(Track::new(TrackId::new("t1"), "Song", "Artist"));
//! session.play();
//! assert_eq!(session.phase(), Phase::Loading);
//!
//! session.media_ready(&TrackId::new("t1"));
//! assert_eq!(session.phase(), Phase::Playing);
//!
//! session.flush().await;
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod display;
pub mod error;
pub mod events;
pub mod liked;
pub mod memory;
pub mod play_log;
pub mod queue;
pub mod seek;
pub mod session;
pub mod transport;
pub mod types;
pub mod volume;

pub use display::{format_time, PlayButton, PlayerView};
pub use error::{PlaybackError, Rejection, Result};
pub use events::{Command, Completion, Diagnostic, DiagnosticSource, SessionEvent};
pub use liked::{Activation, Key, LikedCache};
pub use play_log::PlayLogEmitter;
pub use queue::Queue;
pub use seek::{seek_time, slider_position, SeekEvent};
pub use session::{Collaborators, DiagnosticsReceiver, LobbySession, SessionHandle};
pub use transport::{Dispatch, Intent, TransportMachine};
pub use types::{Phase, SessionConfig};
pub use volume::{VolumeController, VolumeIcon};
