//! Play-log emitter
//!
//! Records one play per distinct `(user, track)` pair. Transport changes
//! that keep the pair (play, pause, seek, volume) never produce a write.

use lobby_core::types::{TrackId, UserId};

/// A `record_play` call to issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayLogTicket {
    pub user_id: UserId,
    pub track_id: TrackId,
}

/// Tracks the last logged pair
#[derive(Debug, Clone, Default)]
pub struct PlayLogEmitter {
    last: Option<(UserId, TrackId)>,
}

impl PlayLogEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notify of the current identity
    ///
    /// Returns a ticket when both ids are present and the pair differs from
    /// the previously logged one. A missing id forgets the last pair, so
    /// returning to the same track later logs again.
    pub fn observe(&mut self, user_id: Option<&UserId>, track_id: Option<&TrackId>) -> Option<PlayLogTicket> {
        let (Some(user_id), Some(track_id)) = (user_id, track_id) else {
            self.last = None;
            return None;
        };

        if let Some((last_user, last_track)) = &self.last {
            if last_user == user_id && last_track == track_id {
                return None;
            }
        }

        self.last = Some((user_id.clone(), track_id.clone()));
        Some(PlayLogTicket {
            user_id: user_id.clone(),
            track_id: track_id.clone(),
        })
    }
}
