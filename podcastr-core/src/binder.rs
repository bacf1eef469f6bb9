//! Keeps one [`MediaElement`] in step with the [`PlayerStore`].
//!
//! State to element: a new selection loads the track and seeks to zero, then the
//! transport intent is applied (play after load, so switching tracks while playing
//! starts the new one right away).
//!
//! Element to state: native events become [`PlayerCommand`]s via [`reaction`] and are
//! dispatched to the store. Events from a superseded load are dropped.

use crate::command::PlayerCommand;
use crate::episode::Episode;
use crate::media::{LoadId, LoadRequest, MediaElement, MediaEvent, Progress};
use crate::playback::PlaybackState;
use crate::store::PlayerStore;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const LOG_TARGET: &str = "podcastr::binder";

/// Events emitted by the media binder
#[derive(Debug, Clone)]
pub enum BinderEvent {
    /// A track was loaded into the element
    TrackLoaded { episode: Episode, load: LoadId },
    /// The element buffered enough to play the current load
    Ready { load: LoadId },
    Playing,
    Paused,
    /// The playlist was cleared and the element released
    Stopped,
    /// Periodic or element-reported position
    Progress(Progress),
    /// The element failed to load or decode the current track
    Error { message: String },
}

/// Commands the store should receive for a native element event.
///
/// `Played` and `Paused` here are changes the element made on its own; the binder
/// drops the echoes of its own transport commands before asking. End of track advances (or replays, when looping) and keeps playing; at the end of
/// a sequential playlist the player is cleared so nothing claims to be playing.
#[must_use]
pub fn reaction(state: &PlaybackState, event: &MediaEvent) -> Vec<PlayerCommand> {
    match event {
        MediaEvent::Ended { .. } => {
            if state.has_next() || state.is_looping() {
                vec![PlayerCommand::Next, PlayerCommand::SetPlaying(true)]
            } else {
                vec![PlayerCommand::Clear]
            }
        }
        MediaEvent::Failed { .. } | MediaEvent::Paused { .. } => {
            vec![PlayerCommand::SetPlaying(false)]
        }
        MediaEvent::Played { .. } => vec![PlayerCommand::SetPlaying(true)],
        MediaEvent::CanPlay { .. } | MediaEvent::TimeUpdate { .. } => Vec::new(),
    }
}

/// What the element was last told
#[derive(Debug, Clone, Copy, Default)]
struct Applied {
    selection: u64,
    playing: bool,
}

pub struct MediaBinder<M: MediaElement> {
    store: Arc<PlayerStore>,
    element: M,
    applied: Applied,
    /// Transport commands sent to the current load whose echo has not arrived yet
    pending_echoes: VecDeque<bool>,
    current_load: Option<LoadId>,
    last_load: LoadId,
    event_tx: broadcast::Sender<BinderEvent>,
}

impl<M: MediaElement> MediaBinder<M> {
    /// Create a binder for `element`. Nothing is applied until the first sync.
    #[must_use]
    pub fn new(store: Arc<PlayerStore>, element: M) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            store,
            element,
            applied: Applied::default(),
            pending_echoes: VecDeque::new(),
            current_load: None,
            last_load: LoadId::new(0),
            event_tx,
        }
    }

    /// Subscribe to binder events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BinderEvent> {
        self.event_tx.subscribe()
    }

    /// The load whose events are currently accepted
    #[must_use]
    pub const fn current_load(&self) -> Option<LoadId> {
        self.current_load
    }

    /// Elapsed time and duration straight from the element
    #[must_use]
    pub fn progress(&self) -> Progress {
        self.element.progress()
    }

    /// Apply the store's current state to the element.
    pub fn sync_with_store(&mut self) {
        let state = self.store.snapshot();
        self.sync(&state);
    }

    /// Apply `state` to the element: load first, transport second.
    pub fn sync(&mut self, state: &PlaybackState) {
        let track_changed = state.selection() != self.applied.selection;
        let playing_changed = state.is_playing() != self.applied.playing;

        if state.current_index().is_none() {
            if self.current_load.take().is_some() {
                info!(target: LOG_TARGET, "Player cleared, releasing audio source");
                self.pending_echoes.clear();
                self.element.unload();
                self.emit(BinderEvent::Stopped);
            }
        } else if track_changed {
            if let Some(episode) = state.current_episode() {
                self.load(episode);
            }
        }

        if self.current_load.is_some() && (track_changed || playing_changed) {
            if state.is_playing() {
                debug!(target: LOG_TARGET, "Resuming playback");
                self.element.play();
                self.pending_echoes.push_back(true);
                self.emit(BinderEvent::Playing);
            } else if playing_changed {
                debug!(target: LOG_TARGET, "Pausing playback");
                self.element.pause();
                self.pending_echoes.push_back(false);
                self.emit(BinderEvent::Paused);
            }
        }

        self.applied = Applied {
            selection: state.selection(),
            playing: state.is_playing(),
        };
    }

    fn load(&mut self, episode: &Episode) {
        self.last_load = self.last_load.next();
        let load = self.last_load;
        self.current_load = Some(load);
        self.pending_echoes.clear();

        info!(
            target: LOG_TARGET,
            "Loading {} ({}) as {}",
            episode.title(),
            episode.duration_display(),
            load
        );
        self.element.load(LoadRequest {
            id: load,
            url: episode.audio_url().to_string(),
            expected_duration: episode.duration(),
        });
        self.element.seek(Duration::ZERO);
        self.emit(BinderEvent::TrackLoaded {
            episode: episode.clone(),
            load,
        });
    }

    /// Handle a native element event, dispatching the resulting commands to the store.
    ///
    /// The element is first brought up to date with the store, so an event from a
    /// track that was replaced in the meantime is recognized as stale. Commands
    /// dispatched here reach the element on the next sync.
    pub fn handle_media_event(&mut self, event: &MediaEvent) {
        self.sync_with_store();

        if self.current_load != Some(event.load()) {
            debug!(target: LOG_TARGET, "Ignoring stale event from {}: {:?}", event.load(), event);
            return;
        }

        match event {
            MediaEvent::CanPlay { load } => self.emit(BinderEvent::Ready { load: *load }),
            MediaEvent::TimeUpdate { position, .. } => {
                let duration = self.element.progress().duration;
                self.emit(BinderEvent::Progress(Progress {
                    elapsed: *position,
                    duration,
                }));
            }
            MediaEvent::Failed { load, reason } => {
                warn!(target: LOG_TARGET, "Audio failed for {}: {}", load, reason);
                self.pending_echoes.clear();
                self.emit(BinderEvent::Error {
                    message: reason.clone(),
                });
            }
            MediaEvent::Ended { load } => {
                debug!(target: LOG_TARGET, "Track ended for {}", load);
            }
            MediaEvent::Played { load } | MediaEvent::Paused { load } => {
                let playing = matches!(event, MediaEvent::Played { .. });
                if self.pending_echoes.front() == Some(&playing) {
                    self.pending_echoes.pop_front();
                    debug!(target: LOG_TARGET, "Transport echo from {}: {:?}", load, event);
                    return;
                }

                // The element changed on its own; earlier echoes will not arrive in order
                self.pending_echoes.clear();
                self.applied.playing = playing;
                self.emit(if playing {
                    BinderEvent::Playing
                } else {
                    BinderEvent::Paused
                });
            }
        }

        let state = self.store.snapshot();
        for command in reaction(&state, event) {
            let name = command.name();
            if let Err(e) = self.store.dispatch(command) {
                error!(target: LOG_TARGET, "Failed to apply {}: {}", name, e);
            }
        }
    }

    /// Start the binder loop in a background task
    pub fn start(
        self,
        media_events: mpsc::UnboundedReceiver<MediaEvent>,
        progress_interval: Duration,
        cancel_token: CancellationToken,
    ) -> tokio::task::JoinHandle<()>
    where
        M: 'static,
    {
        tokio::spawn(self.run(media_events, progress_interval, cancel_token))
    }

    /// Run until cancelled or the media event channel closes.
    pub async fn run(
        mut self,
        mut media_events: mpsc::UnboundedReceiver<MediaEvent>,
        progress_interval: Duration,
        cancel_token: CancellationToken,
    ) {
        info!(target: LOG_TARGET, "Starting media binder");

        let mut state_rx = self.store.subscribe();
        let initial = state_rx.borrow_and_update().clone();
        self.sync(&initial);

        let mut ticker = tokio::time::interval(progress_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = cancel_token.cancelled() => {
                    info!(target: LOG_TARGET, "Media binder shutting down");
                    break;
                }
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        info!(target: LOG_TARGET, "Player store closed");
                        break;
                    }
                    let state = state_rx.borrow_and_update().clone();
                    self.sync(&state);
                }
                event = media_events.recv() => {
                    if let Some(event) = event {
                        self.handle_media_event(&event);
                    } else {
                        info!(target: LOG_TARGET, "Media event channel closed");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if self.current_load.is_some() && self.applied.playing {
                        self.emit(BinderEvent::Progress(self.element.progress()));
                    }
                }
            }
        }

        self.element.pause();
    }

    fn emit(&self, event: BinderEvent) {
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::tests::{abc, episode};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Load(String, LoadId),
        Seek(Duration),
        Play,
        Pause,
        Unload,
    }

    #[derive(Clone, Default)]
    struct RecordingElement {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl RecordingElement {
        fn take(&self) -> Vec<Call> {
            std::mem::take(&mut *self.calls.lock().unwrap())
        }

        fn push(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl MediaElement for RecordingElement {
        fn load(&mut self, request: LoadRequest) {
            self.push(Call::Load(request.url, request.id));
        }

        fn seek(&mut self, position: Duration) {
            self.push(Call::Seek(position));
        }

        fn play(&mut self) {
            self.push(Call::Play);
        }

        fn pause(&mut self) {
            self.push(Call::Pause);
        }

        fn unload(&mut self) {
            self.push(Call::Unload);
        }

        fn progress(&self) -> Progress {
            Progress {
                elapsed: Duration::from_secs(5),
                duration: Duration::from_secs(120),
            }
        }
    }

    fn url(id: &str) -> String {
        format!("https://cdn.example.com/{id}.m4a")
    }

    fn setup() -> (Arc<PlayerStore>, MediaBinder<RecordingElement>, RecordingElement) {
        let store = PlayerStore::new();
        let element = RecordingElement::default();
        let binder = MediaBinder::new(store.clone(), element.clone());
        (store, binder, element)
    }

    fn loaded(binder: &MediaBinder<RecordingElement>) -> LoadId {
        binder.current_load().unwrap()
    }

    #[test]
    fn test_reaction_ended_advances() {
        let mut state = PlaybackState::new();
        state.play_list(abc(), 0).unwrap();
        let event = MediaEvent::Ended { load: LoadId::new(1) };
        assert_eq!(
            reaction(&state, &event),
            vec![PlayerCommand::Next, PlayerCommand::SetPlaying(true)]
        );
    }

    #[test]
    fn test_reaction_ended_on_last_clears() {
        let mut state = PlaybackState::new();
        state.play_list(abc(), 2).unwrap();
        let event = MediaEvent::Ended { load: LoadId::new(1) };
        assert_eq!(reaction(&state, &event), vec![PlayerCommand::Clear]);

        state.toggle_loop();
        assert_eq!(
            reaction(&state, &event),
            vec![PlayerCommand::Next, PlayerCommand::SetPlaying(true)]
        );
    }

    #[test]
    fn test_reaction_transport_events() {
        let state = PlaybackState::new();
        let load = LoadId::new(1);
        assert_eq!(
            reaction(&state, &MediaEvent::Played { load }),
            vec![PlayerCommand::SetPlaying(true)]
        );
        assert_eq!(
            reaction(&state, &MediaEvent::Paused { load }),
            vec![PlayerCommand::SetPlaying(false)]
        );
        assert_eq!(
            reaction(
                &state,
                &MediaEvent::Failed {
                    load,
                    reason: "decode".into()
                }
            ),
            vec![PlayerCommand::SetPlaying(false)]
        );
        assert!(reaction(&state, &MediaEvent::CanPlay { load }).is_empty());
    }

    #[test]
    fn test_sync_on_fresh_store_does_nothing() {
        let (_store, mut binder, element) = setup();
        binder.sync_with_store();
        assert!(element.take().is_empty());
        assert_eq!(binder.current_load(), None);
    }

    #[test]
    fn test_track_change_loads_then_plays() {
        let (store, mut binder, element) = setup();
        store.play_list(abc(), 0).unwrap();

        binder.sync_with_store();

        let load = loaded(&binder);
        assert_eq!(
            element.take(),
            vec![Call::Load(url("a"), load), Call::Seek(Duration::ZERO), Call::Play]
        );
    }

    #[test]
    fn test_toggle_play_only_touches_transport() {
        let (store, mut binder, element) = setup();
        store.play_list(abc(), 0).unwrap();
        binder.sync_with_store();
        element.take();

        store.toggle_play();
        binder.sync_with_store();
        assert_eq!(element.take(), vec![Call::Pause]);

        store.toggle_play();
        binder.sync_with_store();
        assert_eq!(element.take(), vec![Call::Play]);
    }

    #[test]
    fn test_track_change_while_paused_stays_paused() {
        let (store, mut binder, element) = setup();
        store.play_list(abc(), 0).unwrap();
        store.toggle_play();
        binder.sync_with_store();
        element.take();

        store.play_next();
        binder.sync_with_store();

        let load = loaded(&binder);
        assert_eq!(
            element.take(),
            vec![Call::Load(url("b"), load), Call::Seek(Duration::ZERO)]
        );
    }

    #[test]
    fn test_end_of_track_advances_and_keeps_playing() {
        let (store, mut binder, element) = setup();
        store.play_list(abc(), 0).unwrap();
        binder.sync_with_store();
        let first = loaded(&binder);
        element.take();

        binder.handle_media_event(&MediaEvent::Ended { load: first });

        let state = store.snapshot();
        assert_eq!(state.current_index(), Some(1));
        assert!(state.is_playing());

        binder.sync_with_store();
        let second = loaded(&binder);
        assert_ne!(first, second);
        assert_eq!(
            element.take(),
            vec![Call::Load(url("b"), second), Call::Seek(Duration::ZERO), Call::Play]
        );
    }

    #[test]
    fn test_end_of_track_with_loop_replays() {
        let (store, mut binder, element) = setup();
        store.play_list(abc(), 0).unwrap();
        store.toggle_loop();
        binder.sync_with_store();
        let first = loaded(&binder);
        element.take();

        binder.handle_media_event(&MediaEvent::Ended { load: first });
        binder.sync_with_store();

        assert_eq!(store.snapshot().current_index(), Some(0));
        assert!(store.snapshot().is_playing());
        let replay = loaded(&binder);
        assert_eq!(
            element.take(),
            vec![Call::Load(url("a"), replay), Call::Seek(Duration::ZERO), Call::Play]
        );
    }

    #[test]
    fn test_end_of_last_track_clears() {
        let (store, mut binder, element) = setup();
        store.play_list(abc(), 2).unwrap();
        binder.sync_with_store();
        let load = loaded(&binder);
        element.take();
        let mut events = binder.subscribe();

        binder.handle_media_event(&MediaEvent::Ended { load });
        binder.sync_with_store();

        let state = store.snapshot();
        assert!(state.episodes().is_empty());
        assert!(!state.is_playing());
        assert_eq!(binder.current_load(), None);
        assert_eq!(element.take(), vec![Call::Unload]);
        assert!(matches!(events.try_recv(), Ok(BinderEvent::Stopped)));
    }

    #[test]
    fn test_stale_events_are_ignored() {
        let (store, mut binder, _element) = setup();
        store.play_list(abc(), 0).unwrap();
        binder.sync_with_store();
        let stale = loaded(&binder);

        store.play_next();
        binder.sync_with_store();

        binder.handle_media_event(&MediaEvent::Ended { load: stale });
        binder.handle_media_event(&MediaEvent::Failed {
            load: stale,
            reason: "aborted".into(),
        });

        let state = store.snapshot();
        assert_eq!(state.current_index(), Some(1));
        assert!(state.is_playing());
    }

    #[test]
    fn test_end_from_replaced_track_before_resync_is_ignored() {
        let (store, mut binder, element) = setup();
        store.play_list(abc(), 0).unwrap();
        binder.sync_with_store();
        let stale = loaded(&binder);
        element.take();

        // The user skips ahead and the old track's end arrives before the binder sees it
        store.play_next();
        binder.handle_media_event(&MediaEvent::Ended { load: stale });

        let state = store.snapshot();
        assert_eq!(state.current_index(), Some(1));
        assert!(state.is_playing());
        let current = loaded(&binder);
        assert_ne!(current, stale);
        assert_eq!(
            element.take(),
            vec![Call::Load(url("b"), current), Call::Seek(Duration::ZERO), Call::Play]
        );
    }

    #[test]
    fn test_pause_from_replaced_list_before_resync_is_ignored() {
        let (store, mut binder, _element) = setup();
        store.play_list(abc(), 0).unwrap();
        binder.sync_with_store();
        let stale = loaded(&binder);

        store.play_list(abc(), 2).unwrap();
        binder.handle_media_event(&MediaEvent::Paused { load: stale });

        let state = store.snapshot();
        assert_eq!(state.current_index(), Some(2));
        assert!(state.is_playing());
    }

    #[test]
    fn test_echo_of_play_does_not_undo_user_pause() {
        let (store, mut binder, element) = setup();
        store.play_list(abc(), 0).unwrap();
        binder.sync_with_store();
        let load = loaded(&binder);
        element.take();

        // Pause lands before the element confirms the earlier play
        store.toggle_play();
        binder.handle_media_event(&MediaEvent::Played { load });
        assert!(!store.snapshot().is_playing());
        assert_eq!(element.take(), vec![Call::Pause]);

        binder.handle_media_event(&MediaEvent::Paused { load });
        assert!(!store.snapshot().is_playing());

        // Anything after the echoes is the element acting on its own
        binder.handle_media_event(&MediaEvent::Played { load });
        assert!(store.snapshot().is_playing());
        binder.sync_with_store();
        assert!(element.take().is_empty());
    }

    #[test]
    fn test_load_failure_stops_playing_and_reports() {
        let (store, mut binder, element) = setup();
        store.play(episode("x"));
        binder.sync_with_store();
        let load = loaded(&binder);
        element.take();
        let mut events = binder.subscribe();

        binder.handle_media_event(&MediaEvent::Failed {
            load,
            reason: "network error".into(),
        });

        assert!(!store.snapshot().is_playing());
        match events.try_recv() {
            Ok(BinderEvent::Error { message }) => assert_eq!(message, "network error"),
            other => panic!("expected error event, got {other:?}"),
        }

        binder.sync_with_store();
        assert_eq!(element.take(), vec![Call::Pause]);
    }

    #[test]
    fn test_element_pause_updates_intent() {
        let (store, mut binder, _element) = setup();
        store.play(episode("x"));
        binder.sync_with_store();
        let load = loaded(&binder);

        binder.handle_media_event(&MediaEvent::Paused { load });
        assert!(!store.snapshot().is_playing());

        binder.handle_media_event(&MediaEvent::Played { load });
        assert!(store.snapshot().is_playing());
    }

    #[test]
    fn test_progress_reads_element() {
        let (_store, binder, _element) = setup();
        assert_eq!(binder.progress().elapsed, Duration::from_secs(5));
        assert_eq!(binder.progress().duration, Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_run_loop_follows_store_and_events() {
        let store = PlayerStore::new();
        let element = RecordingElement::default();
        let binder = MediaBinder::new(store.clone(), element.clone());
        let mut events = binder.subscribe();
        let (media_tx, media_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let handle = binder.start(media_rx, Duration::from_secs(3600), cancel.clone());

        store.play_list(abc(), 0).unwrap();
        let first = wait_for_load(&mut events).await;
        assert_eq!(first.0.id(), "a");

        media_tx.send(MediaEvent::Ended { load: first.1 }).unwrap();
        let second = wait_for_load(&mut events).await;
        assert_eq!(second.0.id(), "b");
        assert!(store.snapshot().is_playing());

        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(element.take().last(), Some(&Call::Pause));
    }

    async fn wait_for_load(events: &mut broadcast::Receiver<BinderEvent>) -> (Episode, LoadId) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let BinderEvent::TrackLoaded { episode, load } = events.recv().await.unwrap() {
                    return (episode, load);
                }
            }
        })
        .await
        .unwrap()
    }
}
