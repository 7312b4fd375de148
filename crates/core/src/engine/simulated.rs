use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{EngineEvent, EventSink, LoadId, RenderTarget, WaveformEngine};
use crate::{Result, WaveformPeaks};

/// A call made on a [`SimulatedEngine`], recorded in invocation order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load {
        load: LoadId,
        url: String,
        precomputed: bool,
    },
    Play,
    Pause,
    PlayPause,
    Seek(f32),
    Teardown,
}

/// Shared, append-only record of engine calls. Survives the engine itself so
/// callers can inspect what happened after unmount.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    calls: Arc<Mutex<Vec<EngineCall>>>,
}

impl Journal {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock().clone()
    }

    pub fn loads(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                EngineCall::Load { url, .. } => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.lock().iter().filter(|recorded| *recorded == call).count()
    }

    fn record(&self, call: EngineCall) {
        self.lock().push(call);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<EngineCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
struct Source {
    load: LoadId,
    url: String,
    precomputed: Option<WaveformPeaks>,
    decoded: bool,
}

/// In-process engine with no audio output.
///
/// Decode completion, playback completion and failures are driven by the
/// caller through [`SimulatedEngine::decode_complete`],
/// [`SimulatedEngine::finish`] and [`SimulatedEngine::fail`]. Everything else
/// follows the [`WaveformEngine`] contract.
#[derive(Debug)]
pub struct SimulatedEngine {
    target: RenderTarget,
    events: EventSink,
    source: Option<Source>,
    playing: bool,
    progress: f32,
    rendered: WaveformPeaks,
    journal: Journal,
    torn_down: bool,
}

impl SimulatedEngine {
    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    /// URL of the live source, if any.
    pub fn current_url(&self) -> Option<&str> {
        self.source.as_ref().map(|source| source.url.as_str())
    }

    /// Waveform currently drawn into the render target.
    pub fn rendered(&self) -> &WaveformPeaks {
        &self.rendered
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Completes decoding of the live source from `samples` and emits
    /// `ready`. Precomputed peaks win over analysis. Returns `false` when
    /// there is nothing pending.
    pub fn decode_complete(&mut self, samples: &[f32]) -> bool {
        let bars = self.target.width;
        let Some(source) = self.source.as_mut().filter(|source| !source.decoded) else {
            return false;
        };

        source.decoded = true;
        self.rendered = source
            .precomputed
            .take()
            .unwrap_or_else(|| WaveformPeaks::analyse(samples, bars));
        let load = source.load;
        tracing::debug!(url = %source.url, bars = self.rendered.len(), "source decoded");
        self.events.engine(load, EngineEvent::Ready);
        true
    }

    /// Shorthand for [`SimulatedEngine::decode_complete`] with no PCM.
    pub fn fire_ready(&mut self) -> bool {
        self.decode_complete(&[])
    }

    /// Plays the live source to its end and emits `finish`.
    pub fn finish(&mut self) -> bool {
        let Some(load) = self.decoded_load() else {
            return false;
        };

        self.playing = false;
        self.progress = 1.0;
        self.events.engine(load, EngineEvent::Finish);
        true
    }

    /// Reports a decode failure for the live source.
    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        let Some(source) = self.source.as_ref() else {
            return false;
        };

        self.events
            .engine(source.load, EngineEvent::Failed(reason.into()));
        true
    }

    fn decoded_load(&self) -> Option<LoadId> {
        self.source
            .as_ref()
            .filter(|source| source.decoded)
            .map(|source| source.load)
    }

    fn set_playing(&mut self, playing: bool) {
        let Some(load) = self.decoded_load() else {
            return;
        };
        if self.playing == playing {
            return;
        }

        self.playing = playing;
        let event = if playing {
            EngineEvent::Play
        } else {
            EngineEvent::Pause
        };
        self.events.engine(load, event);
    }
}

impl WaveformEngine for SimulatedEngine {
    fn initialize(target: RenderTarget, events: EventSink) -> Result<Self> {
        target.validate()?;
        tracing::debug!(render_target = %target.id, width = target.width, "engine bound to render target");

        Ok(Self {
            target,
            events,
            source: None,
            playing: false,
            progress: 0.0,
            rendered: WaveformPeaks::default(),
            journal: Journal::default(),
            torn_down: false,
        })
    }

    fn load(&mut self, load: LoadId, url: &str, peaks: Option<WaveformPeaks>) {
        if self.torn_down {
            return;
        }

        self.journal.record(EngineCall::Load {
            load,
            url: url.to_string(),
            precomputed: peaks.is_some(),
        });
        self.playing = false;
        self.progress = 0.0;
        self.rendered = WaveformPeaks::default();
        self.source = Some(Source {
            load,
            url: url.to_string(),
            precomputed: peaks,
            decoded: false,
        });
    }

    fn play(&mut self) {
        self.journal.record(EngineCall::Play);
        self.set_playing(true);
    }

    fn pause(&mut self) {
        self.journal.record(EngineCall::Pause);
        self.set_playing(false);
    }

    fn play_pause(&mut self) {
        self.journal.record(EngineCall::PlayPause);
        let playing = !self.playing;
        self.set_playing(playing);
    }

    fn seek(&mut self, progress: f32) {
        self.journal.record(EngineCall::Seek(progress));
        let Some(load) = self.decoded_load() else {
            return;
        };

        self.progress = progress.clamp(0.0, 1.0);
        self.events.engine(load, EngineEvent::Seek(self.progress));
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn teardown(&mut self) {
        self.journal.record(EngineCall::Teardown);
        self.playing = false;
        self.source = None;
        self.rendered = WaveformPeaks::default();
        self.torn_down = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PlayerMessage;

    fn engine() -> (SimulatedEngine, std::sync::mpsc::Receiver<PlayerMessage>) {
        let (sink, rx) = EventSink::channel();
        let engine = SimulatedEngine::initialize(RenderTarget::new("waveform", 4), sink).unwrap();
        (engine, rx)
    }

    fn events(rx: &std::sync::mpsc::Receiver<PlayerMessage>) -> Vec<(LoadId, EngineEvent)> {
        rx.try_iter()
            .filter_map(|message| match message {
                PlayerMessage::Engine { load, event } => Some((load, event)),
                PlayerMessage::Sidecar { .. } => None,
            })
            .collect()
    }

    #[test]
    fn transport_is_inert_without_source() {
        let (mut engine, rx) = engine();
        engine.play();
        engine.seek(0.5);
        assert!(!engine.is_playing());
        assert!(events(&rx).is_empty());
        assert!(!engine.fire_ready());
    }

    #[test]
    fn emits_tagged_lifecycle_events() {
        let (mut engine, rx) = engine();
        let load = LoadId::default().next();
        engine.load(load, "a.mp3", None);
        assert!(engine.decode_complete(&[0.5, 1.0, 0.25, 0.0]));
        engine.play();
        engine.finish();

        assert_eq!(
            events(&rx),
            vec![
                (load, EngineEvent::Ready),
                (load, EngineEvent::Play),
                (load, EngineEvent::Finish),
            ]
        );
        assert_eq!(engine.rendered().data, vec![0.5, 1.0, 0.25, 0.0]);
    }

    #[test]
    fn precomputed_peaks_skip_analysis() {
        let (mut engine, _rx) = engine();
        let peaks = WaveformPeaks::new(vec![0.1, 0.2]);
        engine.load(LoadId::default(), "a.mp3", Some(peaks.clone()));
        engine.decode_complete(&[1.0; 64]);
        assert_eq!(engine.rendered(), &peaks);
        assert!(matches!(
            engine.journal().calls()[0],
            EngineCall::Load { precomputed: true, .. }
        ));
    }

    #[test]
    fn loading_replaces_the_live_source() {
        let (mut engine, _rx) = engine();
        engine.load(LoadId::default(), "a.mp3", None);
        engine.fire_ready();
        engine.play();
        engine.load(LoadId::default().next(), "b.mp3", None);

        assert!(!engine.is_playing());
        assert_eq!(engine.current_url(), Some("b.mp3"));
        assert_eq!(engine.journal().loads(), vec!["a.mp3", "b.mp3"]);
    }

    #[test]
    fn teardown_releases_source() {
        let (mut engine, _rx) = engine();
        engine.load(LoadId::default(), "a.mp3", None);
        engine.teardown();
        engine.load(LoadId::default().next(), "b.mp3", None);

        assert!(engine.is_torn_down());
        assert_eq!(engine.current_url(), None);
        assert_eq!(engine.journal().count(&EngineCall::Teardown), 1);
    }
}
