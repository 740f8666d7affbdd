//! Liked-state cache
//!
//! Optimistic shadow of the liked flag for the current `(user, track)` pair.
//! The authoritative value lives in a [`LikedTracksStore`]; this cache only
//! decides what to ask and whether an answer still applies.
//!
//! Every store call is described by a ticket carrying the identity and
//! generation it was issued against. A completion whose ticket no longer
//! matches is stale and dropped.
//!
//! [`LikedTracksStore`]: lobby_core::LikedTracksStore

use lobby_core::types::{TrackId, UserId};
use lobby_core::LobbyError;

/// Keys that can activate the like control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Other,
}

/// How the like control was activated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Click,
    Key(Key),
}

impl Activation {
    /// Whether this activation toggles the like
    ///
    /// Enter and Space behave exactly like a click; any other key is ignored.
    pub fn triggers_toggle(self) -> bool {
        matches!(self, Self::Click | Self::Key(Key::Enter | Key::Space))
    }
}

/// Pending `is_liked` fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTicket {
    pub user_id: UserId,
    pub track_id: TrackId,
    generation: u64,
    revision: u64,
}

/// Pending `set_liked` write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleTicket {
    pub user_id: UserId,
    pub track_id: TrackId,
    /// Value before the optimistic flip
    pub previous: bool,
    /// Value being persisted
    pub desired: bool,
    generation: u64,
    revision: u64,
}

/// What a completed fetch did to the cache
#[derive(Debug)]
pub enum RefreshOutcome {
    /// Store answered; cache now holds this value
    Applied(bool),

    /// Store answered while a write was outstanding; the answer is kept as
    /// the fallback and the optimistic flag stays
    Deferred(bool),

    /// Store failed; cache fell back to the last confirmed value
    Failed(LobbyError),

    /// Identity changed, or a newer write already confirmed the value
    Stale,
}

/// What a completed write did to the cache
#[derive(Debug)]
pub enum ToggleOutcome {
    /// Store accepted the write
    Persisted,

    /// Last outstanding write failed; cache went back to the confirmed value
    Reverted(LobbyError),

    /// Write failed but the cache moved on or another write is still
    /// outstanding; nothing reverted
    Stale(LobbyError),
}

/// Liked flag for the current identity
///
/// `liked` is what the user sees. `confirmed` is the last value the store
/// vouched for, either by answering a fetch or by accepting a write. Once no
/// write is outstanding the two agree.
#[derive(Debug, Clone, Default)]
pub struct LikedCache {
    user_id: Option<UserId>,
    track_id: Option<TrackId>,
    liked: bool,
    confirmed: bool,
    /// Revision the confirmed value was learned at
    confirmed_revision: u64,
    /// Writes issued for this generation and not yet completed
    pending_writes: u32,
    /// Bumped on every identity change
    generation: u64,
    /// Bumped on every local toggle
    revision: u64,
}

impl LikedCache {
    /// Create cache with no identity
    pub fn new() -> Self {
        Self::default()
    }

    /// Current (possibly optimistic) liked flag
    pub fn is_liked(&self) -> bool {
        self.liked
    }

    /// Whether the like control accepts input
    pub fn is_interactable(is_loading: bool, user_id: Option<&UserId>, track_id: Option<&TrackId>) -> bool {
        !(is_loading || user_id.is_none() || track_id.is_none())
    }

    /// React to a possible identity change
    ///
    /// Refreshes only when `(user, track)` differs from the last observed
    /// pair.
    pub fn observe(&mut self, user_id: Option<&UserId>, track_id: Option<&TrackId>) -> Option<RefreshTicket> {
        if self.user_id.as_ref() == user_id && self.track_id.as_ref() == track_id {
            return None;
        }
        self.refresh(user_id, track_id)
    }

    /// Reset to not-liked and describe the fetch to issue
    ///
    /// Returns `None` when either id is missing: no fetch is needed and the
    /// flag stays false.
    pub fn refresh(&mut self, user_id: Option<&UserId>, track_id: Option<&TrackId>) -> Option<RefreshTicket> {
        self.user_id = user_id.cloned();
        self.track_id = track_id.cloned();
        self.liked = false;
        self.confirmed = false;
        self.confirmed_revision = self.revision;
        self.pending_writes = 0;
        self.generation += 1;

        match (user_id, track_id) {
            (Some(user_id), Some(track_id)) => Some(RefreshTicket {
                user_id: user_id.clone(),
                track_id: track_id.clone(),
                generation: self.generation,
                revision: self.revision,
            }),
            _ => {
                tracing::debug!("Liked refresh skipped, identity incomplete");
                None
            }
        }
    }

    /// Apply the result of a fetch
    ///
    /// The answer becomes the confirmed value unless a write issued after
    /// the fetch has already been accepted. It replaces the visible flag
    /// only while no write is outstanding.
    pub fn complete_refresh(&mut self, ticket: &RefreshTicket, result: lobby_core::Result<bool>) -> RefreshOutcome {
        if ticket.generation != self.generation {
            tracing::debug!(
                user_id = %ticket.user_id,
                track_id = %ticket.track_id,
                "Dropping liked fetch for previous identity"
            );
            return RefreshOutcome::Stale;
        }

        match result {
            Ok(liked) => {
                if ticket.revision < self.confirmed_revision {
                    tracing::debug!(
                        track_id = %ticket.track_id,
                        "Dropping liked fetch older than a saved write"
                    );
                    return RefreshOutcome::Stale;
                }
                self.confirmed = liked;
                self.confirmed_revision = ticket.revision;

                if self.pending_writes > 0 {
                    return RefreshOutcome::Deferred(liked);
                }
                self.liked = liked;
                RefreshOutcome::Applied(liked)
            }
            Err(e) => {
                if self.pending_writes == 0 {
                    self.liked = self.confirmed;
                }
                RefreshOutcome::Failed(e)
            }
        }
    }

    /// Flip the flag optimistically and describe the write to issue
    ///
    /// Returns `None` (and changes nothing) when either id is missing.
    pub fn begin_toggle(&mut self) -> Option<ToggleTicket> {
        let (Some(user_id), Some(track_id)) = (self.user_id.clone(), self.track_id.clone()) else {
            tracing::debug!("Like toggle ignored, identity incomplete");
            return None;
        };

        let previous = self.liked;
        self.liked = !previous;
        self.revision += 1;
        self.pending_writes += 1;

        Some(ToggleTicket {
            user_id,
            track_id,
            previous,
            desired: self.liked,
            generation: self.generation,
            revision: self.revision,
        })
    }

    /// Apply the result of a write
    ///
    /// When the last outstanding write for the current identity completes,
    /// the flag settles on the confirmed value. A failure therefore reverts
    /// to what the store last vouched for, not to the optimistic value an
    /// earlier unsaved toggle left behind.
    pub fn complete_toggle(&mut self, ticket: &ToggleTicket, result: lobby_core::Result<()>) -> ToggleOutcome {
        if ticket.generation != self.generation {
            return match result {
                Ok(()) => ToggleOutcome::Persisted,
                Err(e) => ToggleOutcome::Stale(e),
            };
        }

        self.pending_writes = self.pending_writes.saturating_sub(1);
        let settled = self.pending_writes == 0;

        match result {
            Ok(()) => {
                if ticket.revision >= self.confirmed_revision {
                    self.confirmed = ticket.desired;
                    self.confirmed_revision = ticket.revision;
                }
                if settled {
                    self.liked = self.confirmed;
                }
                ToggleOutcome::Persisted
            }
            Err(e) if settled => {
                self.liked = self.confirmed;
                ToggleOutcome::Reverted(e)
            }
            Err(e) => ToggleOutcome::Stale(e),
        }
    }
}
