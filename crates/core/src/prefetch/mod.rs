//! Waveform sidecar prefetch.
//!
//! Before a source reaches the engine the player asks a [`SidecarFetcher`] for
//! `<audio>.json`. The answer comes back over the player's channel so it can
//! be discarded if the load was superseded in the meantime.

use std::path::PathBuf;

use crate::{engine::EventSink, sidecar_url, LoadId, PlayerError, Result, WaveformPeaks};

pub trait SidecarFetcher {
    /// Starts fetching the sidecar for `audio_url` and reports the outcome
    /// through `reply`, tagged with `load`.
    fn fetch(&mut self, load: LoadId, audio_url: &str, reply: &EventSink);
}

/// Fetcher that never finds a sidecar, forcing client-side analysis.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSidecar;

impl SidecarFetcher for NoSidecar {
    fn fetch(&mut self, load: LoadId, audio_url: &str, reply: &EventSink) {
        let url = sidecar_url(audio_url);
        reply.sidecar(
            load,
            audio_url,
            Err(PlayerError::Sidecar {
                url,
                reason: "sidecar lookup disabled".to_string(),
            }),
        );
    }
}

/// Reads sidecars from the local filesystem.
///
/// Relative URLs resolve against `root`, `file://` URLs are used as-is, and
/// any other scheme is reported as unavailable.
#[derive(Debug, Clone)]
pub struct FsSidecarFetcher {
    root: PathBuf,
}

impl FsSidecarFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, url: &str) -> Result<WaveformPeaks> {
        let path = self.resolve(url)?;
        let payload = std::fs::read(&path).map_err(|err| PlayerError::Sidecar {
            url: url.to_string(),
            reason: err.to_string(),
        })?;
        WaveformPeaks::from_sidecar(url, &payload)
    }

    fn resolve(&self, url: &str) -> Result<PathBuf> {
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if url.contains("://") {
            return Err(PlayerError::Sidecar {
                url: url.to_string(),
                reason: "unsupported scheme".to_string(),
            });
        }
        Ok(self.root.join(url.trim_start_matches('/')))
    }
}

impl SidecarFetcher for FsSidecarFetcher {
    fn fetch(&mut self, load: LoadId, audio_url: &str, reply: &EventSink) {
        let url = sidecar_url(audio_url);
        let peaks = self.read(&url);
        if let Err(err) = &peaks {
            tracing::debug!(%err, "waveform sidecar not found on disk");
        }
        reply.sidecar(load, audio_url, peaks);
    }
}
