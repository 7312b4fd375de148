/// Result alias that carries the custom [`PlayerError`] type.
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// Free-form failure that has no dedicated variant.
    #[error("{0}")]
    Message(String),
    /// The selected artist id is not part of the catalogue.
    #[error("unknown artist `{0}`")]
    UnknownArtist(String),
    /// The selected release id is not listed under the artist.
    #[error("unknown release `{release}` for artist `{artist}`")]
    UnknownRelease { artist: String, release: String },
    /// A release was mounted that has nothing to play.
    #[error("release `{0}` has no tracks")]
    EmptyRelease(String),
    /// The track has neither a stream map nor a file list to play from.
    #[error("track `{0}` has no playable source")]
    NoPlayableSource(String),
    /// The engine was handed a render target it cannot draw into.
    #[error("invalid render target: {0}")]
    InvalidRenderTarget(String),
    /// The engine could not decode the live source.
    #[error("failed to decode `{url}`: {reason}")]
    Decode { url: String, reason: String },
    /// A waveform sidecar could not be fetched or parsed. Only ever logged.
    #[error("waveform sidecar `{url}` unavailable: {reason}")]
    Sidecar { url: String, reason: String },
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON (de)serialization errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl PlayerError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Returns `true` for failures the player is expected to swallow.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Sidecar { .. })
    }
}

impl From<&str> for PlayerError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for PlayerError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
