//! Lobby session - explicit context object for one listening session
//!
//! Owns the transport machine, queue, volume memory, liked cache and play-log
//! emitter, and wires them to the external collaborators.
//!
//! # Concurrency
//!
//! The session is a single-owner actor. Every mutation happens while handling
//! one event on the owning task. Network side effects are spawned onto the
//! runtime and report back as [`Completion`]s, which are applied on the
//! owning task via [`LobbySession::apply_completion`] (directly, through
//! [`LobbySession::flush`], or inside [`LobbySession::run`]).
//!
//! Outbound transport intents go through a single propagator task so they
//! reach the channel in the order they were issued.

use lobby_core::types::{SessionId, Track, TrackId, TransportIntent, TransportState, UserId};
use lobby_core::{LikedTracksStore, PlayLogService, TransportChannel};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::display::{PlayerView, ViewFlags};
use crate::error::{PlaybackError, Result};
use crate::events::{Command, Completion, Diagnostic, DiagnosticSource, SessionEvent};
use crate::liked::{Activation, LikedCache, RefreshOutcome, RefreshTicket, ToggleOutcome, ToggleTicket};
use crate::play_log::{PlayLogEmitter, PlayLogTicket};
use crate::queue::Queue;
use crate::seek::{seek_time, SeekEvent};
use crate::transport::{Dispatch, Intent, TransportMachine};
use crate::types::{Phase, SessionConfig};
use crate::volume::VolumeController;

/// Buffer of the event channel behind a [`SessionHandle`]
const EVENT_BUFFER: usize = 64;

/// Receiving end of the diagnostics channel
pub type DiagnosticsReceiver = mpsc::UnboundedReceiver<Diagnostic>;

/// External services a session talks to
#[derive(Clone)]
pub struct Collaborators {
    pub channel: Arc<dyn TransportChannel>,
    pub liked_store: Arc<dyn LikedTracksStore>,
    pub play_log: Arc<dyn PlayLogService>,
}

/// One client's view of a lobby
pub struct LobbySession {
    id: SessionId,
    config: SessionConfig,
    user_id: Option<UserId>,
    machine: TransportMachine,
    queue: Queue,
    volume: VolumeController,
    liked: LikedCache,
    play_log: PlayLogEmitter,
    collaborators: Collaborators,
    outbound: mpsc::UnboundedSender<TransportIntent>,
    propagator: JoinHandle<()>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    /// Side effects spawned but not yet applied
    pending: usize,
    diagnostics: mpsc::UnboundedSender<Diagnostic>,
}

impl LobbySession {
    /// Create a session
    ///
    /// Must be called inside a tokio runtime (spawns the propagator).
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid
    pub fn new(
        config: SessionConfig,
        user_id: Option<UserId>,
        collaborators: Collaborators,
    ) -> Result<(Self, DiagnosticsReceiver)> {
        config.validate()?;

        let (outbound, intents) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (diagnostics, diagnostics_rx) = mpsc::unbounded_channel();

        let propagator = tokio::spawn(propagate(
            Arc::clone(&collaborators.channel),
            intents,
            completions_tx.clone(),
        ));

        let mut machine = TransportMachine::new(TransportState::with_volume(config.initial_volume));
        machine.set_controls_disabled(config.controls_disabled);

        let id = SessionId::generate();
        info!(session_id = %id, user_id = ?user_id.as_ref().map(UserId::as_str), "Session opened");

        let mut session = Self {
            id,
            config,
            user_id,
            machine,
            queue: Queue::new(),
            volume: VolumeController::new(),
            liked: LikedCache::new(),
            play_log: PlayLogEmitter::new(),
            collaborators,
            outbound,
            propagator,
            completions_tx,
            completions_rx,
            pending: 0,
            diagnostics,
        };
        session.sync_identity();

        Ok((session, diagnostics_rx))
    }

    // ===== Commands =====

    /// Start playback
    pub fn play(&mut self) -> Dispatch {
        self.dispatch(Intent::Play)
    }

    /// Pause playback (also releases a pending load)
    pub fn pause(&mut self) -> Dispatch {
        self.dispatch(Intent::Pause)
    }

    /// Play button: pause while playing or loading, play otherwise
    pub fn toggle_playback(&mut self) -> Dispatch {
        match self.machine.phase() {
            Phase::Playing | Phase::Loading => self.pause(),
            Phase::Paused | Phase::Empty => self.play(),
        }
    }

    /// Volume slider input
    pub fn set_volume(&mut self, level: i32) -> Dispatch {
        self.dispatch(Intent::ChangeVolume(VolumeController::set_volume(level)))
    }

    /// Mute button
    ///
    /// Mute memory is only written when the volume change is accepted.
    pub fn toggle_mute(&mut self) -> Dispatch {
        let current = self.machine.state().volume;
        if let Err(reason) = self.machine.check(&Intent::ChangeVolume(0)) {
            debug!(%reason, "Mute toggle rejected");
            return Dispatch::Rejected(reason);
        }

        let Some(target) = self.volume.toggle_target(current) else {
            debug!("Unmute with no remembered volume");
            return Dispatch::Unchanged;
        };

        let dispatch = self.dispatch(Intent::ChangeVolume(target));
        if dispatch.is_applied() {
            self.volume.commit_toggle(current);
        }
        dispatch
    }

    /// Seek slider movement
    pub fn seek_preview(&mut self, slider: f64) -> Dispatch {
        self.seek(slider, SeekEvent::Preview)
    }

    /// Seek slider release
    pub fn seek_commit(&mut self, slider: f64) -> Dispatch {
        self.seek(slider, SeekEvent::Commit)
    }

    /// Seek to a slider position (0-100)
    pub fn seek(&mut self, slider: f64, event: SeekEvent) -> Dispatch {
        let seconds = seek_time(slider, self.machine.state().duration_seconds);
        trace!(?event, slider, seconds, "Seek");
        self.dispatch(Intent::ChangeTime(seconds))
    }

    /// Load a track
    pub fn change_music(&mut self, track: Track) -> Dispatch {
        self.dispatch(Intent::ChangeMusic(track))
    }

    /// Advance to the head of the queue
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Dispatch {
        self.dispatch(Intent::Next)
    }

    /// Append a track to the queue
    pub fn enqueue(&mut self, track: Track) {
        debug!(track_id = %track.id, "Track queued");
        self.queue.enqueue(track);
    }

    /// Like button
    ///
    /// Flips the liked flag right away and persists it in the background.
    /// Returns false when the control is not interactable.
    pub fn toggle_like(&mut self) -> bool {
        if !self.like_interactable() {
            debug!("Like toggle ignored, control not interactable");
            return false;
        }

        match self.liked.begin_toggle() {
            Some(ticket) => {
                self.spawn_liked_write(ticket);
                true
            }
            None => false,
        }
    }

    /// Like button activated by click or key
    pub fn activate_like(&mut self, activation: Activation) -> bool {
        activation.triggers_toggle() && self.toggle_like()
    }

    /// Run a command
    pub fn execute(&mut self, command: Command) {
        match command {
            Command::Play => {
                self.play();
            }
            Command::Pause => {
                self.pause();
            }
            Command::TogglePlayback => {
                self.toggle_playback();
            }
            Command::SetVolume(level) => {
                self.set_volume(level);
            }
            Command::ToggleMute => {
                self.toggle_mute();
            }
            Command::Seek { slider, event } => {
                self.seek(slider, event);
            }
            Command::ChangeMusic(track) => {
                self.change_music(track);
            }
            Command::Next => {
                self.next();
            }
            Command::Enqueue(track) => self.enqueue(track),
            Command::ToggleLike => {
                self.toggle_like();
            }
            Command::ActivateLike(activation) => {
                self.activate_like(activation);
            }
        }
    }

    // ===== Host inputs =====

    /// Signed-in user changed
    pub fn set_user(&mut self, user_id: Option<UserId>) {
        if self.user_id == user_id {
            return;
        }
        info!(user_id = ?user_id.as_ref().map(UserId::as_str), "User changed");
        self.user_id = user_id;
        self.sync_identity();
    }

    /// Grant or revoke transport control
    pub fn set_controls_disabled(&mut self, disabled: bool) {
        debug!(disabled, "Controls gate changed");
        self.machine.set_controls_disabled(disabled);
    }

    /// Authoritative state from the lobby
    pub fn apply_remote(&mut self, state: TransportState) {
        if self.machine.apply_remote(state) {
            debug!(track_id = ?self.machine.state().track_id, "Broadcast changed track");
        }
        self.sync_identity();
    }

    /// Media for `track_id` is ready; settles a pending play
    pub fn media_ready(&mut self, track_id: &TrackId) -> bool {
        self.machine.settle(track_id)
    }

    /// Media for `track_id` failed; reverts a pending play
    pub fn media_failed(&mut self, track_id: &TrackId) -> bool {
        match self.machine.fail_loading(track_id) {
            Some(pause) => {
                self.report(DiagnosticSource::Loading, format!("Media for {} failed to load", track_id));
                self.propagate(pause);
                true
            }
            None => false,
        }
    }

    /// Revert a play that has been loading past the configured timeout
    pub fn expire_loading(&mut self, now: Instant) -> bool {
        let Some(timeout) = self.config.loading_timeout() else {
            return false;
        };
        let Some(track_id) = self.machine.loading_track().cloned() else {
            return false;
        };

        match self.machine.expire_loading(now, timeout) {
            Some(pause) => {
                self.report(
                    DiagnosticSource::Loading,
                    format!("{} did not start within {} ms", track_id, timeout.as_millis()),
                );
                self.propagate(pause);
                true
            }
            None => false,
        }
    }

    /// Handle one actor event
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Command(command) => self.execute(command),
            SessionEvent::Remote(state) => self.apply_remote(state),
            SessionEvent::MediaReady(track_id) => {
                self.media_ready(&track_id);
            }
            SessionEvent::MediaFailed(track_id) => {
                self.media_failed(&track_id);
            }
            SessionEvent::Tick(now) => {
                self.expire_loading(now);
            }
            SessionEvent::SetUser(user_id) => self.set_user(user_id),
            SessionEvent::SetControlsDisabled(disabled) => self.set_controls_disabled(disabled),
        }
    }

    // ===== Completions =====

    /// Apply the result of a spawned side effect
    pub fn apply_completion(&mut self, completion: Completion) {
        self.pending = self.pending.saturating_sub(1);

        match completion {
            Completion::Propagated { intent, result } => match result {
                Ok(()) => trace!(intent = intent.kind(), "Intent propagated"),
                Err(e) => {
                    warn!(intent = intent.kind(), error = %e, "Failed to propagate intent");
                    self.report(
                        DiagnosticSource::Channel,
                        format!("Failed to propagate {}: {}", intent.kind(), e),
                    );
                }
            },

            Completion::LikedFetched { ticket, result } => {
                match self.liked.complete_refresh(&ticket, result) {
                    RefreshOutcome::Applied(liked) => {
                        debug!(track_id = %ticket.track_id, liked, "Liked state loaded");
                    }
                    RefreshOutcome::Deferred(liked) => {
                        debug!(track_id = %ticket.track_id, liked, "Liked state loaded, toggle in flight");
                    }
                    RefreshOutcome::Failed(e) => {
                        warn!(track_id = %ticket.track_id, error = %e, "Failed to load liked state");
                        self.report(DiagnosticSource::LikedStore, e.to_string());
                    }
                    RefreshOutcome::Stale => {}
                }
            }

            Completion::LikedWritten { ticket, result } => {
                match self.liked.complete_toggle(&ticket, result) {
                    ToggleOutcome::Persisted => {
                        debug!(track_id = %ticket.track_id, liked = ticket.desired, "Liked state saved");
                    }
                    ToggleOutcome::Reverted(e) => {
                        warn!(track_id = %ticket.track_id, error = %e, "Failed to save liked state, reverted");
                        self.report(DiagnosticSource::LikedStore, e.to_string());
                    }
                    ToggleOutcome::Stale(e) => {
                        warn!(track_id = %ticket.track_id, error = %e, "Failed to save liked state");
                        self.report(DiagnosticSource::LikedStore, e.to_string());
                    }
                }
            }

            Completion::PlayLogged { ticket, result } => match result {
                Ok(()) => debug!(track_id = %ticket.track_id, "Play recorded"),
                Err(e) => {
                    warn!(track_id = %ticket.track_id, error = %e, "Failed to record play");
                    self.report(DiagnosticSource::PlayLog, e.to_string());
                }
            },
        }
    }

    /// Wait for every in-flight side effect and apply its result
    pub async fn flush(&mut self) {
        while self.pending > 0 {
            match self.completions_rx.recv().await {
                Some(completion) => self.apply_completion(completion),
                None => break,
            }
        }
    }

    /// Actor loop
    ///
    /// Handles events until every sender is dropped, publishing a fresh view
    /// after each step, then closes the session.
    pub async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>, view: watch::Sender<PlayerView>) {
        let mut ticker = tokio::time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                Some(completion) = self.completions_rx.recv() => self.apply_completion(completion),
                _ = ticker.tick() => {
                    self.expire_loading(Instant::now());
                }
            }
            view.send_replace(self.view());
        }

        self.close().await;
    }

    /// Move the session onto its own task
    pub fn spawn(self) -> (SessionHandle, JoinHandle<()>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (view_tx, view_rx) = watch::channel(self.view());
        let task = tokio::spawn(self.run(events_rx, view_tx));

        (
            SessionHandle {
                events: events_tx,
                view: view_rx,
            },
            task,
        )
    }

    // ===== Reads =====

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Local transport state
    pub fn state(&self) -> &TransportState {
        self.machine.state()
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn is_liked(&self) -> bool {
        self.liked.is_liked()
    }

    /// Remembered pre-mute volume
    pub fn volume_memory(&self) -> Option<u8> {
        self.volume.memory()
    }

    /// Whether the like control accepts input
    pub fn like_interactable(&self) -> bool {
        LikedCache::is_interactable(
            self.machine.is_loading(),
            self.user_id.as_ref(),
            self.machine.state().track_id.as_ref(),
        )
    }

    /// Whether transport controls accept input
    pub fn controls_enabled(&self) -> bool {
        self.machine.controls_enabled()
    }

    /// Side effects not yet applied
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Display snapshot
    pub fn view(&self) -> PlayerView {
        PlayerView::build(
            self.machine.state(),
            &self.queue,
            ViewFlags {
                liked: self.liked.is_liked(),
                like_interactable: self.like_interactable(),
                controls_enabled: self.machine.controls_enabled(),
            },
        )
    }

    // ===== Teardown =====

    /// Tear down the session
    ///
    /// Intents already issued are still delivered before this returns.
    /// Liked, queue and play-log state go with the session; completions of
    /// liked fetches and writes still in flight are dropped.
    pub async fn close(self) {
        let Self {
            id,
            outbound,
            propagator,
            ..
        } = self;

        drop(outbound);
        if let Err(e) = propagator.await {
            warn!(session_id = %id, error = %e, "Propagator task failed");
        }
        info!(session_id = %id, "Session closed");
    }

    // ===== Internals =====

    fn dispatch(&mut self, intent: Intent) -> Dispatch {
        let dispatch = self.machine.dispatch(intent, &mut self.queue);
        if let Dispatch::Applied(wire) = &dispatch {
            let track_changed = matches!(wire, TransportIntent::ChangeMusic(_));
            self.propagate(wire.clone());
            if track_changed {
                self.sync_identity();
            }
        }
        dispatch
    }

    /// Re-derive liked state, then log the play
    fn sync_identity(&mut self) {
        let user_id = self.user_id.clone();
        let track_id = self.machine.state().track_id.clone();

        if let Some(ticket) = self.liked.observe(user_id.as_ref(), track_id.as_ref()) {
            self.spawn_liked_fetch(ticket);
        }
        if let Some(ticket) = self.play_log.observe(user_id.as_ref(), track_id.as_ref()) {
            self.spawn_play_log(ticket);
        }
    }

    fn propagate(&mut self, intent: TransportIntent) {
        match self.outbound.send(intent) {
            Ok(()) => self.pending += 1,
            Err(e) => warn!(intent = e.0.kind(), "Propagator gone, intent dropped"),
        }
    }

    fn spawn_liked_fetch(&mut self, ticket: RefreshTicket) {
        let store = Arc::clone(&self.collaborators.liked_store);
        let completions = self.completions_tx.clone();
        self.pending += 1;

        tokio::spawn(async move {
            let result = store.is_liked(&ticket.user_id, &ticket.track_id).await;
            post(&completions, Completion::LikedFetched { ticket, result });
        });
    }

    fn spawn_liked_write(&mut self, ticket: ToggleTicket) {
        let store = Arc::clone(&self.collaborators.liked_store);
        let completions = self.completions_tx.clone();
        self.pending += 1;

        tokio::spawn(async move {
            let result = store
                .set_liked(&ticket.user_id, &ticket.track_id, ticket.desired)
                .await;
            post(&completions, Completion::LikedWritten { ticket, result });
        });
    }

    fn spawn_play_log(&mut self, ticket: PlayLogTicket) {
        let service = Arc::clone(&self.collaborators.play_log);
        let completions = self.completions_tx.clone();
        self.pending += 1;

        tokio::spawn(async move {
            let result = service.record_play(&ticket.user_id, &ticket.track_id).await;
            post(&completions, Completion::PlayLogged { ticket, result });
        });
    }

    fn report(&self, source: DiagnosticSource, message: String) {
        if self.diagnostics.send(Diagnostic::new(source, message)).is_err() {
            trace!("Diagnostics receiver dropped");
        }
    }
}

/// Deliver intents to the channel one at a time, in issuance order
async fn propagate(
    channel: Arc<dyn TransportChannel>,
    mut intents: mpsc::UnboundedReceiver<TransportIntent>,
    completions: mpsc::UnboundedSender<Completion>,
) {
    while let Some(intent) = intents.recv().await {
        let result = channel.update_state(intent.clone()).await;
        post(&completions, Completion::Propagated { intent, result });
    }
    debug!("Propagator stopped");
}

fn post(completions: &mpsc::UnboundedSender<Completion>, completion: Completion) {
    if completions.send(completion).is_err() {
        trace!("Session gone, completion dropped");
    }
}

/// Cloneable handle to a session running on its own task
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::Sender<SessionEvent>,
    view: watch::Receiver<PlayerView>,
}

impl SessionHandle {
    /// Send an event to the session
    ///
    /// # Errors
    /// Returns [`PlaybackError::SessionClosed`] if the session task has stopped
    pub async fn send(&self, event: impl Into<SessionEvent>) -> Result<()> {
        self.events
            .send(event.into())
            .await
            .map_err(|_| PlaybackError::SessionClosed)
    }

    /// Latest published view
    pub fn view(&self) -> PlayerView {
        self.view.borrow().clone()
    }

    /// Wait for the next published view
    ///
    /// # Errors
    /// Returns [`PlaybackError::SessionClosed`] if the session task has stopped
    pub async fn changed(&mut self) -> Result<PlayerView> {
        self.view
            .changed()
            .await
            .map_err(|_| PlaybackError::SessionClosed)?;
        Ok(self.view.borrow_and_update().clone())
    }
}
