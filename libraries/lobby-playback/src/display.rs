//! Display model
//!
//! Pure functions of session state, so any host (terminal, web view, test)
//! renders the same thing.

use lobby_core::types::{PlayState, Track, TrackId, TransportState};
use serde::Serialize;

use crate::queue::Queue;
use crate::seek::slider_position;
use crate::volume::VolumeIcon;

/// Title shown when nothing is loaded
pub const NO_TRACK_TITLE: &str = "No Song Selected";

/// Format seconds as `m:ss`
///
/// Minutes are floored and unbounded; non-finite or negative input shows `0:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// What the play button offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayButton {
    Play,
    Pause,
}

impl PlayButton {
    /// Button for a play state
    pub fn for_state(state: PlayState) -> Self {
        match state {
            PlayState::Playing => Self::Pause,
            PlayState::Paused => Self::Play,
        }
    }
}

/// Queue row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueRow {
    pub title: String,
    pub artist: String,
}

impl From<&Track> for QueueRow {
    fn from(track: &Track) -> Self {
        Self {
            title: track.title.clone(),
            artist: track.artist.clone(),
        }
    }
}

/// Snapshot of everything a player UI shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub track_id: Option<TrackId>,
    pub title: String,
    pub artist: String,
    pub image_url: Option<String>,
    pub play_button: PlayButton,
    pub elapsed: String,
    pub total: String,
    pub slider: f64,
    pub volume: u8,
    pub volume_icon: VolumeIcon,
    pub liked: bool,
    pub like_interactable: bool,
    pub controls_enabled: bool,
    pub queue: Vec<QueueRow>,
}

/// Flags owned by the session rather than the transport state
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewFlags {
    pub liked: bool,
    pub like_interactable: bool,
    pub controls_enabled: bool,
}

impl PlayerView {
    /// Build a snapshot
    pub fn build(state: &TransportState, queue: &Queue, flags: ViewFlags) -> Self {
        let (title, artist) = if state.has_track() {
            (state.title.clone(), state.artist.clone())
        } else {
            (NO_TRACK_TITLE.to_string(), String::new())
        };

        Self {
            track_id: state.track_id.clone(),
            title,
            artist,
            image_url: state.image_url.clone(),
            play_button: PlayButton::for_state(state.effective_play_state()),
            elapsed: format_time(state.position_seconds),
            total: format_time(state.duration_seconds),
            slider: slider_position(state.position_seconds, state.duration_seconds),
            volume: state.volume,
            volume_icon: VolumeIcon::for_volume(state.volume),
            liked: flags.liked,
            like_interactable: flags.like_interactable,
            controls_enabled: flags.controls_enabled,
            queue: queue.iter().map(QueueRow::from).collect(),
        }
    }
}

impl std::fmt::Display for PlayerView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let button = match self.play_button {
            PlayButton::Play => "▶",
            PlayButton::Pause => "⏸",
        };
        let heart = if self.liked { "♥" } else { "♡" };
        write!(f, "{} {}", button, self.title)?;
        if !self.artist.is_empty() {
            write!(f, " - {}", self.artist)?;
        }
        write!(
            f,
            "  {} / {}  vol {} ({:?})  {}",
            self.elapsed, self.total, self.volume, self.volume_icon, heart
        )?;
        if !self.controls_enabled {
            write!(f, "  [locked]")?;
        }
        Ok(())
    }
}
