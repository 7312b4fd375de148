//! Waveform peak data: the `<audio>.json` sidecar format and client-side
//! analysis used when no sidecar is available.

use serde::{Deserialize, Serialize};

use crate::{PlayerError, Result};

const SIDECAR_SUFFIX: &str = ".json";
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Returns the URL of the precomputed waveform for `audio_url`.
pub fn sidecar_url(audio_url: &str) -> String {
    format!("{audio_url}{SIDECAR_SUFFIX}")
}

/// Peak amplitude per rendered bar.
///
/// Serialized as `{ "data": [...] }`, the sidecar layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveformPeaks {
    pub data: Vec<f32>,
}

impl WaveformPeaks {
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Parses a sidecar payload. `url` only labels the error.
    pub fn from_sidecar(url: &str, payload: &[u8]) -> Result<Self> {
        let peaks: Self = serde_json::from_slice(payload).map_err(|err| PlayerError::Sidecar {
            url: url.to_string(),
            reason: err.to_string(),
        })?;

        if peaks.data.iter().any(|value| !value.is_finite()) {
            return Err(PlayerError::Sidecar {
                url: url.to_string(),
                reason: "non-finite sample in waveform data".to_string(),
            });
        }

        Ok(peaks)
    }

    pub fn to_sidecar(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reduces decoded PCM to `bars` absolute peaks.
    ///
    /// Buckets are as even as integer division allows; trailing samples land
    /// in the last bucket. Fewer samples than bars yields one bar per sample.
    pub fn analyse(samples: &[f32], bars: usize) -> Self {
        if samples.is_empty() || bars == 0 {
            return Self::default();
        }

        let bars = bars.min(samples.len());
        let bucket = samples.len() / bars;
        let data = (0..bars)
            .map(|bar| {
                let start = bar * bucket;
                let end = if bar + 1 == bars {
                    samples.len()
                } else {
                    start + bucket
                };
                peak(&samples[start..end])
            })
            .collect();

        Self { data }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Amplitude at `position` (0.0-1.0 of the source), zero outside range.
    pub fn amplitude_at(&self, position: f32) -> f32 {
        if self.data.is_empty() || !(0.0..=1.0).contains(&position) {
            return 0.0;
        }

        let index = (position * (self.data.len() - 1) as f32).round() as usize;
        self.data.get(index).copied().unwrap_or(0.0)
    }

    /// Renders the peaks as a one-line block-character strip `width` wide.
    pub fn sparkline(&self, width: usize) -> String {
        if self.data.is_empty() || width == 0 {
            return String::new();
        }

        let loudest = self.data.iter().fold(0.0_f32, |max, value| max.max(value.abs()));
        let scale = if loudest > f32::EPSILON { loudest } else { 1.0 };
        let last = (width.max(2) - 1) as f32;

        (0..width)
            .map(|column| {
                let level = self.amplitude_at(column as f32 / last).abs() / scale;
                let slot = (level * (SPARK_LEVELS.len() - 1) as f32).round() as usize;
                SPARK_LEVELS[slot.min(SPARK_LEVELS.len() - 1)]
            })
            .collect()
    }
}

fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .fold(0.0_f32, |max, sample| max.max(sample.abs()))
}
