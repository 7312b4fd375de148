//! Contract between the sequencer and the audio decode/playback/waveform
//! primitive, plus the message channel the engine reports back on.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::{PlayerError, Result, WaveformPeaks};

mod simulated;

pub use simulated::{EngineCall, Journal, SimulatedEngine};

/// Sequence number attached to every load request.
///
/// Strictly increasing per player; events carrying an older id belong to a
/// superseded load and are dropped by the receiver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadId(u64);

impl LoadId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Lifecycle notifications emitted by an engine for its live source.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Decode and analysis finished; the source is playable.
    Ready,
    /// The playhead moved to `progress` (0.0-1.0).
    Seek(f32),
    /// The source played to completion.
    Finish,
    Play,
    Pause,
    /// Decode failed. There is no recovery path.
    Failed(String),
}

/// Everything that flows back into the sequencer.
#[derive(Debug)]
pub enum PlayerMessage {
    Engine {
        load: LoadId,
        event: EngineEvent,
    },
    /// Outcome of the waveform prefetch for `audio_url`.
    Sidecar {
        load: LoadId,
        audio_url: String,
        peaks: Result<WaveformPeaks>,
    },
}

/// Sending half of the player's message channel.
///
/// Sends after the player is gone are dropped; that is how late responses to
/// an unmounted player get discarded.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<PlayerMessage>,
}

impl EventSink {
    pub fn channel() -> (Self, Receiver<PlayerMessage>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    pub fn engine(&self, load: LoadId, event: EngineEvent) {
        self.send(PlayerMessage::Engine { load, event });
    }

    pub fn sidecar(&self, load: LoadId, audio_url: &str, peaks: Result<WaveformPeaks>) {
        self.send(PlayerMessage::Sidecar {
            load,
            audio_url: audio_url.to_string(),
            peaks,
        });
    }

    fn send(&self, message: PlayerMessage) {
        if self.tx.send(message).is_err() {
            tracing::trace!("player gone, dropping message");
        }
    }
}

/// Where the engine draws its waveform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    pub id: String,
    /// Number of waveform bars the target can show.
    pub width: usize,
}

impl RenderTarget {
    pub fn new(id: impl Into<String>, width: usize) -> Self {
        Self {
            id: id.into(),
            width,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(PlayerError::InvalidRenderTarget(
                "render target id is empty".to_string(),
            ));
        }
        if self.width == 0 {
            return Err(PlayerError::InvalidRenderTarget(format!(
                "render target `{}` has zero width",
                self.id
            )));
        }
        Ok(())
    }
}

/// Audio decode + playback primitive bound to one render target and at most
/// one live source.
///
/// Transport calls are no-ops while nothing is loaded. Events go out through
/// the [`EventSink`] handed to [`WaveformEngine::initialize`], tagged with the
/// [`LoadId`] of the source that produced them.
pub trait WaveformEngine {
    fn initialize(target: RenderTarget, events: EventSink) -> Result<Self>
    where
        Self: Sized;

    /// Replaces the live source. Precomputed `peaks` skip client-side
    /// analysis.
    fn load(&mut self, load: LoadId, url: &str, peaks: Option<WaveformPeaks>);

    fn play(&mut self);

    fn pause(&mut self);

    fn play_pause(&mut self);

    fn seek(&mut self, progress: f32);

    fn is_playing(&self) -> bool;

    /// Releases decode and render resources. Called exactly once.
    fn teardown(&mut self);
}
