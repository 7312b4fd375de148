use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{catalogue::DEFAULT_QUALITY, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub player: PlayerConfig,
    pub labels: Labels,
}

impl AppConfig {
    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Reads an options file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

/// Configuration specific to the release player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Stream quality label tried first. Fixed for the lifetime of a mount.
    pub quality: String,
    /// Width of the waveform render target, in bars.
    pub waveform_bars: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY.to_string(),
            waveform_bars: 512,
        }
    }
}

/// Headings used when presenting a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub release_info: String,
    pub release_links: String,
    pub credits: String,
    pub credits_writing: String,
    pub credits_performance: String,
    pub credits_production: String,
    pub credits_engineering: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            release_info: "Release Info".to_string(),
            release_links: "Links".to_string(),
            credits: "Credits".to_string(),
            credits_writing: "Writing".to_string(),
            credits_performance: "Performance".to_string(),
            credits_production: "Production".to_string(),
            credits_engineering: "Engineering".to_string(),
        }
    }
}
