//! Seek functionality (slider percentage to shared timeline)
//!
//! The seek slider works in percent of the track. Both scrub movement
//! (preview) and release (commit) become the same `ChangeTime` intent, so
//! every movement is a shared-state mutation.

use serde::{Deserialize, Serialize};

/// Slider range upper bound
const SLIDER_MAX: f64 = 100.0;

/// Which slider event produced a seek
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeekEvent {
    /// Continuous movement while scrubbing
    Preview,

    /// Slider released
    Commit,
}

/// Absolute position for a slider value
///
/// `slider` is clamped to 0-100. A zero, negative or non-finite duration
/// yields 0, so no NaN can reach the shared state.
pub fn seek_time(slider: f64, duration_seconds: f64) -> f64 {
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return 0.0;
    }
    let slider = if slider.is_finite() {
        slider.clamp(0.0, SLIDER_MAX)
    } else {
        0.0
    };
    (slider / SLIDER_MAX) * duration_seconds
}

/// Slider value for the current position
///
/// Returns 0 when the duration is unknown.
pub fn slider_position(position_seconds: f64, duration_seconds: f64) -> f64 {
    let percent = position_seconds / duration_seconds * SLIDER_MAX;
    if percent.is_finite() {
        percent.clamp(0.0, SLIDER_MAX)
    } else {
        0.0
    }
}
