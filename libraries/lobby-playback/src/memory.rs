//! In-memory collaborators
//!
//! Stand-ins for the lobby channel, liked store and play log, used by the
//! console host and by tests. Each can be switched into a failing mode.

use async_trait::async_trait;
use lobby_core::types::{TrackId, TransportIntent, TransportState, UserId};
use lobby_core::{LikedTracksStore, LobbyError, PlayLogService, Result, TransportChannel};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{broadcast, Mutex, RwLock};

/// Broadcast buffer for state updates
const BROADCAST_CAPACITY: usize = 64;

/// Lobby channel that keeps the authoritative state in process
///
/// Every accepted intent is applied to the stored state and the full new
/// state is broadcast to subscribers, as a lobby-wide store would.
pub struct LoopbackChannel {
    state: RwLock<TransportState>,
    updates: broadcast::Sender<TransportState>,
    sent: Mutex<Vec<TransportIntent>>,
    failing: AtomicBool,
}

impl LoopbackChannel {
    /// Create channel holding `initial`
    pub fn new(initial: TransportState) -> Self {
        let (updates, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            state: RwLock::new(initial),
            updates,
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Receive every state the channel publishes
    pub fn subscribe(&self) -> broadcast::Receiver<TransportState> {
        self.updates.subscribe()
    }

    /// Make subsequent updates fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Authoritative state
    pub async fn snapshot(&self) -> TransportState {
        self.state.read().await.clone()
    }

    /// Intents accepted so far, in arrival order
    pub async fn sent(&self) -> Vec<TransportIntent> {
        self.sent.lock().await.clone()
    }
}

impl Default for LoopbackChannel {
    fn default() -> Self {
        Self::new(TransportState::default())
    }
}

#[async_trait]
impl TransportChannel for LoopbackChannel {
    async fn update_state(&self, intent: TransportIntent) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LobbyError::channel("loopback channel unavailable"));
        }

        let updated = {
            let mut state = self.state.write().await;
            state.apply_intent(&intent);
            state.clone()
        };
        self.sent.lock().await.push(intent);

        if self.updates.send(updated).is_err() {
            tracing::trace!("No broadcast subscribers");
        }
        Ok(())
    }
}

/// Liked-tracks store backed by a set of `(user, track)` pairs
#[derive(Default)]
pub struct InMemoryLikedStore {
    liked: RwLock<HashSet<(UserId, TrackId)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryLikedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a liked pair
    #[must_use]
    pub fn with_liked(mut self, user_id: UserId, track_id: TrackId) -> Self {
        self.liked.get_mut().insert((user_id, track_id));
        self
    }

    /// Make `is_liked` fail
    pub fn set_fail_reads(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    /// Make `set_liked` fail
    pub fn set_fail_writes(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    /// Number of `is_liked` calls, failed ones included
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `set_liked` calls, failed ones included
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Stored value, bypassing failure injection
    pub async fn contains(&self, user_id: &UserId, track_id: &TrackId) -> bool {
        self.liked
            .read()
            .await
            .contains(&(user_id.clone(), track_id.clone()))
    }
}

#[async_trait]
impl LikedTracksStore for InMemoryLikedStore {
    async fn is_liked(&self, user_id: &UserId, track_id: &TrackId) -> Result<bool> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(LobbyError::liked_store("read failed"));
        }
        Ok(self.contains(user_id, track_id).await)
    }

    async fn set_liked(&self, user_id: &UserId, track_id: &TrackId, liked: bool) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LobbyError::liked_store("write failed"));
        }

        let key = (user_id.clone(), track_id.clone());
        let mut set = self.liked.write().await;
        if liked {
            set.insert(key);
        } else {
            set.remove(&key);
        }
        Ok(())
    }
}

/// Play log that records writes in order
#[derive(Default)]
pub struct InMemoryPlayLog {
    records: Mutex<Vec<(UserId, TrackId)>>,
    failing: AtomicBool,
}

impl InMemoryPlayLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successful writes so far
    pub async fn records(&self) -> Vec<(UserId, TrackId)> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl PlayLogService for InMemoryPlayLog {
    async fn record_play(&self, user_id: &UserId, track_id: &TrackId) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LobbyError::play_log("write failed"));
        }
        self.records
            .lock()
            .await
            .push((user_id.clone(), track_id.clone()));
        Ok(())
    }
}
