//! Volume control with mute memory
//!
//! The volume itself lives in the shared transport state. This controller
//! only remembers the level to restore on unmute and maps levels to icons.

use lobby_core::types::MAX_VOLUME;
use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of the "low" icon range
const LOW_VOLUME_MAX: u8 = 40;

/// Mute/restore state machine over the shared volume channel
///
/// Muting records the current level and asks for 0. Unmuting asks for the
/// recorded level. The recorded level survives unmute so the next mute
/// overwrites it rather than clearing it.
#[derive(Debug, Clone, Default)]
pub struct VolumeController {
    /// Pre-mute volume, set on first mute
    memory: Option<u8>,
}

impl VolumeController {
    /// Create controller with no remembered level
    pub fn new() -> Self {
        Self::default()
    }

    /// Volume the mute button should request, given the current volume
    ///
    /// Returns `None` when nothing should be issued: the transport is at 0
    /// and no pre-mute level was ever recorded, so it stays at 0.
    /// Does not touch memory; call [`commit_toggle`](Self::commit_toggle)
    /// once the resulting intent is accepted.
    pub fn toggle_target(&self, current: u8) -> Option<u8> {
        if current > 0 {
            Some(0)
        } else {
            self.memory
        }
    }

    /// Record the pre-mute level after a mute was accepted
    pub fn commit_toggle(&mut self, current: u8) {
        if current > 0 {
            self.memory = Some(current);
        }
    }

    /// Toggle mute in one step
    ///
    /// Equivalent to [`toggle_target`](Self::toggle_target) followed by
    /// [`commit_toggle`](Self::commit_toggle).
    pub fn toggle_mute(&mut self, current: u8) -> Option<u8> {
        let target = self.toggle_target(current);
        if target.is_some() {
            self.commit_toggle(current);
        }
        target
    }

    /// Slider input, clamped to 0-100
    ///
    /// Bypasses mute memory entirely.
    pub fn set_volume(level: i32) -> u8 {
        level.clamp(0, i32::from(MAX_VOLUME)) as u8
    }

    /// Remembered pre-mute level
    pub fn memory(&self) -> Option<u8> {
        self.memory
    }
}

/// Volume indicator icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeIcon {
    /// Volume is 0
    Muted,

    /// Volume is 1-40
    Low,

    /// Volume is above 40
    High,
}

impl VolumeIcon {
    /// Icon for a volume level
    pub fn for_volume(volume: u8) -> Self {
        match volume {
            0 => Self::Muted,
            1..=LOW_VOLUME_MAX => Self::Low,
            _ => Self::High,
        }
    }
}
