/// Transport state types shared by every member of a lobby
use serde::{Deserialize, Serialize};

use super::ids::TrackId;
use super::track::Track;

/// Highest volume level
pub const MAX_VOLUME: u8 = 100;

/// Play/pause flag of the shared transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayState {
    /// Audio is advancing
    Playing,

    /// Paused mid-track (or nothing loaded)
    #[default]
    Paused,
}

/// The single shared truth for a lobby
///
/// Position and duration are in seconds. A duration of 0 means unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportState {
    /// Loaded track (None = nothing loaded)
    pub track_id: Option<TrackId>,

    /// Display title
    #[serde(default)]
    pub title: String,

    /// Display artist
    #[serde(default)]
    pub artist: String,

    /// Cover art location
    #[serde(default)]
    pub image_url: Option<String>,

    /// Play/pause flag
    pub play_state: PlayState,

    /// Current position in seconds
    pub position_seconds: f64,

    /// Track duration in seconds (0 = unknown)
    pub duration_seconds: f64,

    /// Volume level (0-100)
    pub volume: u8,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            track_id: None,
            title: String::new(),
            artist: String::new(),
            image_url: None,
            play_state: PlayState::Paused,
            position_seconds: 0.0,
            duration_seconds: 0.0,
            volume: 80,
        }
    }
}

impl TransportState {
    /// Create an empty transport at the given volume
    pub fn with_volume(volume: u8) -> Self {
        Self {
            volume: volume.min(MAX_VOLUME),
            ..Self::default()
        }
    }

    /// Whether a track is loaded
    pub fn has_track(&self) -> bool {
        self.track_id.is_some()
    }

    /// Play state with the "no track means paused" rule applied
    pub fn effective_play_state(&self) -> PlayState {
        if self.has_track() {
            self.play_state
        } else {
            PlayState::Paused
        }
    }

    /// Apply an intent verbatim
    ///
    /// Used both for the local optimistic update and by stores that keep the
    /// authoritative copy. Validity checks belong to the caller.
    pub fn apply_intent(&mut self, intent: &TransportIntent) {
        match intent {
            TransportIntent::Play => self.play_state = PlayState::Playing,
            TransportIntent::Pause => self.play_state = PlayState::Paused,
            TransportIntent::ChangeVolume(volume) => self.volume = (*volume).min(MAX_VOLUME),
            TransportIntent::ChangeTime(seconds) => self.position_seconds = *seconds,
            TransportIntent::ChangeMusic(track) => {
                self.track_id = Some(track.id.clone());
                self.title.clone_from(&track.title);
                self.artist.clone_from(&track.artist);
                self.image_url.clone_from(&track.image_url);
                self.duration_seconds = track.duration_seconds.unwrap_or(0.0);
                self.position_seconds = 0.0;
            }
        }
        self.sanitize();
    }

    /// Restore the invariants after an external write
    ///
    /// - non-finite or negative times become 0
    /// - position never exceeds a known duration
    /// - volume is capped at 100
    /// - nothing loaded means paused
    pub fn sanitize(&mut self) {
        if !self.duration_seconds.is_finite() || self.duration_seconds < 0.0 {
            self.duration_seconds = 0.0;
        }
        if !self.position_seconds.is_finite() || self.position_seconds < 0.0 {
            self.position_seconds = 0.0;
        }
        if self.duration_seconds > 0.0 && self.position_seconds > self.duration_seconds {
            self.position_seconds = self.duration_seconds;
        }
        self.volume = self.volume.min(MAX_VOLUME);
        if self.track_id.is_none() {
            self.play_state = PlayState::Paused;
        }
    }

    /// Consume and return a sanitized copy
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.sanitize();
        self
    }
}

/// Intent sent over the lobby channel
///
/// Serialized as `{"kind": "CHANGE_TIME", "payload": 42.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportIntent {
    Play,
    Pause,
    ChangeVolume(u8),
    ChangeTime(f64),
    ChangeMusic(Track),
}

impl TransportIntent {
    /// Wire name of the intent kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Play => "PLAY",
            Self::Pause => "PAUSE",
            Self::ChangeVolume(_) => "CHANGE_VOLUME",
            Self::ChangeTime(_) => "CHANGE_TIME",
            Self::ChangeMusic(_) => "CHANGE_MUSIC",
        }
    }
}
