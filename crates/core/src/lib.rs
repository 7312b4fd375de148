//! Core library for the Release Player.
//!
//! A catalogue of artists and releases goes in, together with the
//! `(artist, release)` pair the surrounding application has selected. The
//! crate plays that release track by track through a waveform engine and
//! derives the view the application renders. Modules are layered leaves
//! first: catalogue and waveform data, the engine contract, prefetch, the
//! sequencing player, and the selection session on top.

pub mod catalogue;
pub mod config;
pub mod engine;
pub mod error;
pub mod player;
pub mod prefetch;
pub mod presentation;
pub mod session;
pub mod waveform;

pub use catalogue::{ArtistEntry, Catalogue, Credits, Links, Release, Track};
pub use config::{AppConfig, Labels, PlayerConfig};
pub use engine::{
    EngineEvent, EventSink, LoadId, PlayerMessage, RenderTarget, SimulatedEngine, WaveformEngine,
};
pub use error::{PlayerError, Result};
pub use player::{DownloadTrigger, PlayerState, ReleasePlayer, Selection};
pub use prefetch::{FsSidecarFetcher, NoSidecar, SidecarFetcher};
pub use presentation::{present, DownloadLink, ReleaseView};
pub use session::PlayerSession;
pub use waveform::{sidecar_url, WaveformPeaks};
