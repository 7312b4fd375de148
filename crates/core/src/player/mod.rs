//! Track sequencer for one mounted release.
//!
//! [`ReleasePlayer`] owns the engine, the prefetch collaborator and the only
//! copy of [`PlayerState`]. Engine and prefetch results arrive as messages on
//! a channel drained by [`ReleasePlayer::pump`]; every message is tagged with
//! the [`LoadId`] of the load that caused it and anything older than the
//! latest request is dropped.

use std::sync::mpsc::Receiver;

use crate::{
    engine::{EngineEvent, EventSink, PlayerMessage, RenderTarget, WaveformEngine},
    presentation::{present, DownloadLink, ReleaseView},
    Catalogue, Labels, LoadId, PlayerConfig, PlayerError, Release, Result, SidecarFetcher, Track,
    WaveformPeaks,
};

/// The `(artist, release)` pair chosen by the surrounding application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub artist: String,
    pub release: String,
}

impl Selection {
    pub fn new(artist: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            release: release.into(),
        }
    }

    /// A selection with an empty half renders nothing.
    pub fn is_blank(&self) -> bool {
        self.artist.is_empty() || self.release.is_empty()
    }
}

/// Playback state of the mounted release. Only the player mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub active_track: usize,
    pub is_playing: bool,
    /// True from the moment a load is requested until its `ready` arrives.
    pub is_loading: bool,
    pub tracks: Vec<Track>,
    pub quality: String,
}

/// Environment-provided save-as. Fire and forget.
pub trait DownloadTrigger {
    fn save_as(&mut self, url: &str, filename: &str);
}

#[derive(Debug)]
struct PendingLoad {
    load: LoadId,
    url: String,
}

pub struct ReleasePlayer<E: WaveformEngine, F: SidecarFetcher> {
    selection: Selection,
    release: Release,
    state: PlayerState,
    engine: E,
    fetcher: F,
    sink: EventSink,
    inbox: Receiver<PlayerMessage>,
    pending: PendingLoad,
    torn_down: bool,
}

impl<E: WaveformEngine, F: SidecarFetcher> ReleasePlayer<E, F> {
    /// Binds an engine to `target` and starts loading the first track.
    pub fn mount(
        catalogue: &Catalogue,
        selection: Selection,
        target: RenderTarget,
        fetcher: F,
        config: &PlayerConfig,
    ) -> Result<Self> {
        let release = catalogue
            .release(&selection.artist, &selection.release)?
            .clone();
        if release.tracks.is_empty() {
            return Err(PlayerError::EmptyRelease(release.title));
        }
        // Fail before touching the engine if the first track cannot play.
        let first = release.tracks[0].resolve_source(&config.quality)?.to_string();

        let (sink, inbox) = EventSink::channel();
        let engine = E::initialize(target, sink.clone())?;

        tracing::info!(
            artist = %selection.artist,
            release = %selection.release,
            tracks = release.tracks.len(),
            "mounting release player"
        );

        let state = PlayerState {
            active_track: 0,
            is_playing: false,
            is_loading: false,
            tracks: release.tracks.clone(),
            quality: config.quality.clone(),
        };

        let mut player = Self {
            selection,
            release,
            state,
            engine,
            fetcher,
            sink,
            inbox,
            pending: PendingLoad {
                load: LoadId::default(),
                url: String::new(),
            },
            torn_down: false,
        };
        player.request(0, first);
        Ok(player)
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn release(&self) -> &Release {
        &self.release
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable engine access, for drivers that simulate engine-side input.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Sequence number of the most recent load request.
    pub fn latest_load(&self) -> LoadId {
        self.pending.load
    }

    pub fn view(&self, labels: &Labels) -> ReleaseView {
        present(&self.state, &self.release, labels)
    }

    /// Dispatches every queued message in arrival order.
    ///
    /// Stops at the first fatal error; messages behind it stay queued.
    pub fn pump(&mut self) -> Result<usize> {
        let mut handled = 0;
        while let Ok(message) = self.inbox.try_recv() {
            self.dispatch(message)?;
            handled += 1;
        }
        Ok(handled)
    }

    pub fn dispatch(&mut self, message: PlayerMessage) -> Result<()> {
        if self.torn_down {
            return Ok(());
        }

        match message {
            PlayerMessage::Sidecar {
                load,
                audio_url,
                peaks,
            } => {
                self.on_sidecar(load, &audio_url, peaks);
                Ok(())
            }
            PlayerMessage::Engine { load, event } => {
                if load != self.pending.load {
                    tracing::debug!(
                        stale = load.value(),
                        latest = self.pending.load.value(),
                        ?event,
                        "dropping event from superseded load"
                    );
                    return Ok(());
                }
                self.on_engine(event)
            }
        }
    }

    /// User picked a track row, or pressed play/pause when `index` is `None`.
    ///
    /// Picking the active track toggles instead of reloading. Indices past
    /// the end are ignored.
    pub fn select_track(&mut self, index: Option<usize>) -> Result<()> {
        match index {
            None => {
                self.toggle();
                Ok(())
            }
            Some(index) if index == self.state.active_track => {
                self.toggle();
                Ok(())
            }
            Some(index) if index >= self.state.tracks.len() => {
                tracing::debug!(index, "ignoring selection of unknown track");
                Ok(())
            }
            Some(index) => {
                let url = self.state.tracks[index]
                    .resolve_source(&self.state.quality)?
                    .to_string();
                self.engine.pause();
                self.request(index, url);
                Ok(())
            }
        }
    }

    /// Play/pause on the engine itself. Accepted even while loading.
    pub fn toggle(&mut self) {
        self.engine.play_pause();
        self.state.is_playing = self.engine.is_playing();
    }

    /// User scrubbed the waveform.
    pub fn seek(&mut self, progress: f32) {
        self.engine.seek(progress);
    }

    /// Hands download `entry` of track `index` to the environment's save-as.
    pub fn download(
        &self,
        index: usize,
        entry: usize,
        trigger: &mut impl DownloadTrigger,
    ) -> Result<()> {
        let track = self
            .state
            .tracks
            .get(index)
            .ok_or_else(|| PlayerError::msg(format!("no track at index {index}")))?;
        let url = track.download_urls().get(entry).ok_or_else(|| {
            PlayerError::msg(format!("track `{}` has no download {entry}", track.title))
        })?;

        let link = DownloadLink::from_url(url);
        tracing::debug!(url = %link.url, filename = %link.filename, "download requested");
        trigger.save_as(&link.url, &link.filename);
        Ok(())
    }

    /// Tears the engine down. Dropping the player does the same.
    pub fn unmount(mut self) {
        self.shutdown();
    }

    fn on_sidecar(&mut self, load: LoadId, audio_url: &str, peaks: Result<WaveformPeaks>) {
        if load != self.pending.load || audio_url != self.pending.url {
            tracing::debug!(
                stale = load.value(),
                latest = self.pending.load.value(),
                "dropping sidecar for superseded load"
            );
            return;
        }

        let peaks = match peaks {
            Ok(peaks) => Some(peaks),
            Err(err) => {
                tracing::debug!(%err, "no waveform sidecar, engine will analyse the source");
                None
            }
        };
        self.engine.load(load, audio_url, peaks);
    }

    fn on_engine(&mut self, event: EngineEvent) -> Result<()> {
        match event {
            EngineEvent::Ready => {
                if self.state.is_loading {
                    self.engine.play();
                    self.state.is_loading = false;
                    self.state.is_playing = self.engine.is_playing();
                    tracing::debug!(track = self.state.active_track, "track ready");
                }
            }
            EngineEvent::Finish => {
                self.state.is_playing = self.engine.is_playing();
                let next = (self.state.active_track + 1) % self.state.tracks.len();
                let url = self.state.tracks[next]
                    .resolve_source(&self.state.quality)?
                    .to_string();
                self.request(next, url);
            }
            EngineEvent::Seek(progress) => {
                if !self.engine.is_playing() {
                    self.engine.play();
                }
                self.state.is_playing = self.engine.is_playing();
                tracing::trace!(progress, "seek");
            }
            EngineEvent::Play | EngineEvent::Pause => {
                self.state.is_playing = self.engine.is_playing();
            }
            EngineEvent::Failed(reason) => {
                return Err(PlayerError::Decode {
                    url: self.pending.url.clone(),
                    reason,
                });
            }
        }
        Ok(())
    }

    /// Marks `index` loading and starts the prefetch. The engine sees the
    /// source once the prefetch answers.
    fn request(&mut self, index: usize, url: String) {
        let load = self.pending.load.next();
        self.state.active_track = index;
        self.state.is_loading = true;
        self.state.is_playing = self.engine.is_playing();
        self.pending = PendingLoad { load, url };

        tracing::debug!(track = index, load = load.value(), url = %self.pending.url, "requesting load");
        self.fetcher.fetch(load, &self.pending.url, &self.sink);
    }

    fn shutdown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.engine.teardown();
        tracing::info!(
            artist = %self.selection.artist,
            release = %self.selection.release,
            "release player unmounted"
        );
    }
}

impl<E: WaveformEngine, F: SidecarFetcher> Drop for ReleasePlayer<E, F> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<E: WaveformEngine, F: SidecarFetcher> std::fmt::Debug for ReleasePlayer<E, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleasePlayer")
            .field("selection", &self.selection)
            .field("state", &self.state)
            .field("latest_load", &self.pending.load)
            .field("torn_down", &self.torn_down)
            .finish()
    }
}
