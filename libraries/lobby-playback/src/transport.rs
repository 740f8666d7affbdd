//! Transport state machine - owner of the shared transport state
//!
//! Turns local intents into optimistic state changes plus the wire intent to
//! propagate. Phase table:
//!
//! ```text
//!            Play            settle
//!   Paused ────────► Loading ───────► Playing
//!     ▲                 │                │
//!     │   fail/timeout  │                │
//!     ├─────────────────┘                │
//!     │            Pause                 │
//!     └──────────────────────────────────┘
//!
//!   Empty: no track. ChangeMusic/Next load one (keeping the play flag).
//! ```
//!
//! While `Loading` or while controls are disabled every intent except
//! `Pause` is rejected. `Pause` stays available so a stuck load can always
//! be stopped.

use lobby_core::types::{PlayState, Track, TrackId, TransportIntent, TransportState, MAX_VOLUME};
use std::time::{Duration, Instant};

use crate::error::Rejection;
use crate::queue::Queue;
use crate::types::Phase;

/// Local user intent
///
/// Closed set: every variant is handled exhaustively by the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Start playback of the loaded track
    Play,

    /// Pause playback (always accepted while playing or loading)
    Pause,

    /// Set the shared volume (0-100)
    ChangeVolume(u8),

    /// Move to an absolute position in seconds
    ChangeTime(f64),

    /// Load a new track at position 0
    ChangeMusic(Track),

    /// Advance to the head of the queue
    Next,
}

/// Result of dispatching an intent
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// State changed locally; the intent must be propagated
    Applied(TransportIntent),

    /// Accepted but nothing to do (e.g. `Next` on an empty queue)
    Unchanged,

    /// Refused; state untouched
    Rejected(Rejection),
}

impl Dispatch {
    /// Whether local state changed
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// Wire intent to propagate, if any
    pub fn intent(&self) -> Option<&TransportIntent> {
        match self {
            Self::Applied(intent) => Some(intent),
            Self::Unchanged | Self::Rejected(_) => None,
        }
    }
}

/// Identity a pending play was issued against
#[derive(Debug, Clone)]
struct LoadingTicket {
    track_id: TrackId,
    since: Instant,
}

/// Authoritative local copy of the lobby transport
#[derive(Debug, Clone)]
pub struct TransportMachine {
    state: TransportState,
    loading: Option<LoadingTicket>,
    controls_disabled: bool,
}

impl TransportMachine {
    /// Create machine over an initial state
    pub fn new(initial: TransportState) -> Self {
        Self {
            state: initial.sanitized(),
            loading: None,
            controls_disabled: false,
        }
    }

    /// Current transport state
    pub fn state(&self) -> &TransportState {
        &self.state
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        if !self.state.has_track() {
            Phase::Empty
        } else if self.loading.is_some() {
            Phase::Loading
        } else {
            match self.state.play_state {
                PlayState::Playing => Phase::Playing,
                PlayState::Paused => Phase::Paused,
            }
        }
    }

    /// Whether a play is waiting to settle
    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    /// Track the pending play was issued for
    pub fn loading_track(&self) -> Option<&TrackId> {
        self.loading.as_ref().map(|ticket| &ticket.track_id)
    }

    /// Whether the session-level gate is closed
    pub fn controls_disabled(&self) -> bool {
        self.controls_disabled
    }

    /// Open or close the session-level gate
    pub fn set_controls_disabled(&mut self, disabled: bool) {
        self.controls_disabled = disabled;
    }

    /// Whether transport controls are usable right now
    pub fn controls_enabled(&self) -> bool {
        !self.controls_disabled && self.loading.is_none()
    }

    /// Check an intent against the gate and the phase table
    ///
    /// `Next` is accepted here even with an empty queue; the empty case is
    /// resolved during dispatch.
    pub fn check(&self, intent: &Intent) -> Result<(), Rejection> {
        let phase = self.phase();
        match intent {
            Intent::Pause => match phase {
                Phase::Playing | Phase::Loading => Ok(()),
                Phase::Paused => Err(Rejection::NotPlaying),
                Phase::Empty => Err(Rejection::NoTrack),
            },
            _ if self.controls_disabled => Err(Rejection::ControlsDisabled),
            _ if self.loading.is_some() => Err(Rejection::Loading),
            Intent::Play => match phase {
                Phase::Paused => Ok(()),
                Phase::Playing => Err(Rejection::AlreadyPlaying),
                Phase::Empty => Err(Rejection::NoTrack),
                Phase::Loading => Err(Rejection::Loading),
            },
            Intent::ChangeTime(_) if !self.state.has_track() => Err(Rejection::NoTrack),
            Intent::ChangeTime(_)
            | Intent::ChangeVolume(_)
            | Intent::ChangeMusic(_)
            | Intent::Next => Ok(()),
        }
    }

    /// Validate and apply an intent
    ///
    /// The local state is updated before this returns; the caller
    /// propagates the returned wire intent afterwards.
    pub fn dispatch(&mut self, intent: Intent, queue: &mut Queue) -> Dispatch {
        if let Err(reason) = self.check(&intent) {
            tracing::debug!(?intent, %reason, "Intent rejected");
            return Dispatch::Rejected(reason);
        }

        let wire = match intent {
            Intent::Play => TransportIntent::Play,
            Intent::Pause => TransportIntent::Pause,
            Intent::ChangeVolume(volume) => TransportIntent::ChangeVolume(volume.min(MAX_VOLUME)),
            Intent::ChangeTime(seconds) => TransportIntent::ChangeTime(self.clamp_position(seconds)),
            Intent::ChangeMusic(track) => TransportIntent::ChangeMusic(track),
            Intent::Next => match queue.dequeue() {
                Some(track) => TransportIntent::ChangeMusic(track),
                None => {
                    tracing::debug!("Next requested with an empty queue");
                    return Dispatch::Unchanged;
                }
            },
        };

        self.state.apply_intent(&wire);

        match wire {
            TransportIntent::Play => {
                self.loading = self.state.track_id.clone().map(|track_id| LoadingTicket {
                    track_id,
                    since: Instant::now(),
                });
            }
            TransportIntent::Pause => {
                if let Some(ticket) = self.loading.take() {
                    tracing::info!(track_id = %ticket.track_id, "Pause released a pending load");
                }
            }
            TransportIntent::ChangeVolume(_)
            | TransportIntent::ChangeTime(_)
            | TransportIntent::ChangeMusic(_) => {}
        }

        tracing::debug!(intent = wire.kind(), phase = ?self.phase(), "Intent applied");
        Dispatch::Applied(wire)
    }

    /// The pending play for `track_id` is confirmed
    ///
    /// Returns false when nothing was loading or the signal is for another
    /// track (stale).
    pub fn settle(&mut self, track_id: &TrackId) -> bool {
        if self.loading_track() == Some(track_id) {
            self.loading = None;
            tracing::debug!(%track_id, "Play settled");
            true
        } else {
            tracing::debug!(%track_id, "Ignoring settle for a track that is not loading");
            false
        }
    }

    /// The pending play for `track_id` failed
    ///
    /// Reverts to paused and returns the `Pause` to propagate.
    pub fn fail_loading(&mut self, track_id: &TrackId) -> Option<TransportIntent> {
        if self.loading_track() != Some(track_id) {
            tracing::debug!(%track_id, "Ignoring failure for a track that is not loading");
            return None;
        }

        self.loading = None;
        let pause = TransportIntent::Pause;
        self.state.apply_intent(&pause);
        tracing::warn!(%track_id, "Play failed to settle, reverted to paused");
        Some(pause)
    }

    /// Fail the pending play if it has been loading for `timeout` or longer
    pub fn expire_loading(&mut self, now: Instant, timeout: Duration) -> Option<TransportIntent> {
        let ticket = self.loading.as_ref()?;
        if now.saturating_duration_since(ticket.since) < timeout {
            return None;
        }
        let track_id = ticket.track_id.clone();
        self.fail_loading(&track_id)
    }

    /// Replace local state with an authoritative broadcast
    ///
    /// Applied as received (after numeric sanitizing); last writer wins.
    /// Any pending load ends here: it settles if the broadcast confirms the
    /// loading track is playing, otherwise it is abandoned.
    /// Returns whether track identity changed.
    pub fn apply_remote(&mut self, incoming: TransportState) -> bool {
        let incoming = incoming.sanitized();
        let track_changed = incoming.track_id != self.state.track_id;

        if let Some(ticket) = self.loading.take() {
            let confirmed = incoming.track_id.as_ref() == Some(&ticket.track_id)
                && incoming.play_state == PlayState::Playing;
            if confirmed {
                tracing::debug!(track_id = %ticket.track_id, "Play settled by broadcast");
            } else {
                tracing::debug!(track_id = %ticket.track_id, "Broadcast superseded pending play");
            }
        }

        self.state = incoming;
        track_changed
    }

    fn clamp_position(&self, seconds: f64) -> f64 {
        let seconds = if seconds.is_finite() {
            seconds.max(0.0)
        } else {
            0.0
        };
        if self.state.duration_seconds > 0.0 {
            seconds.min(self.state.duration_seconds)
        } else {
            seconds
        }
    }
}

impl Default for TransportMachine {
    fn default() -> Self {
        Self::new(TransportState::default())
    }
}
