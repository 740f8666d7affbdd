//! Session events
//!
//! Everything that can change a [`LobbySession`](crate::LobbySession) arrives
//! as one of these:
//! - Local commands from the host UI
//! - Authoritative broadcasts from the lobby
//! - Media readiness signals
//! - Completions of the session's own network side effects
//!
//! Failures of side effects are reported as [`Diagnostic`]s on a
//! non-blocking channel. They never block or roll back transport state.

use chrono::{DateTime, Utc};
use lobby_core::types::{Track, TrackId, TransportIntent, TransportState, UserId};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::liked::{Activation, RefreshTicket, ToggleTicket};
use crate::play_log::PlayLogTicket;
use crate::seek::SeekEvent;

/// Local user command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    /// Play when paused, pause when playing or loading
    TogglePlayback,
    /// Slider input, clamped to 0-100
    SetVolume(i32),
    ToggleMute,
    /// Seek slider movement in percent of the track
    Seek {
        slider: f64,
        event: SeekEvent,
    },
    ChangeMusic(Track),
    Next,
    Enqueue(Track),
    ToggleLike,
    ActivateLike(Activation),
}

/// Input to the session actor loop
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Local user command
    Command(Command),

    /// Whole-state broadcast from the lobby
    Remote(TransportState),

    /// Media for the track is ready to play
    MediaReady(TrackId),

    /// Media for the track failed to load
    MediaFailed(TrackId),

    /// Check the loading timeout against this instant
    Tick(Instant),

    /// Signed-in user changed
    SetUser(Option<UserId>),

    /// Host granted or revoked transport control
    SetControlsDisabled(bool),
}

impl From<Command> for SessionEvent {
    fn from(command: Command) -> Self {
        Self::Command(command)
    }
}

/// Result of a side effect spawned by the session
#[derive(Debug)]
pub enum Completion {
    /// Transport intent handed to the channel (or not)
    Propagated {
        intent: TransportIntent,
        result: lobby_core::Result<()>,
    },

    /// Liked fetch answered
    LikedFetched {
        ticket: RefreshTicket,
        result: lobby_core::Result<bool>,
    },

    /// Liked write answered
    LikedWritten {
        ticket: ToggleTicket,
        result: lobby_core::Result<()>,
    },

    /// Play-log write answered
    PlayLogged {
        ticket: PlayLogTicket,
        result: lobby_core::Result<()>,
    },
}

/// Where a diagnostic came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSource {
    /// Transport channel propagation
    Channel,

    /// Liked-tracks store
    LikedStore,

    /// Play-log service
    PlayLog,

    /// A play that never settled
    Loading,
}

/// Non-fatal failure report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub source: DiagnosticSource,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Diagnostic {
    /// Create diagnostic stamped with the current time
    pub fn new(source: DiagnosticSource, message: impl Into<String>) -> Self {
        Self {
            source,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.source, self.message)
    }
}
