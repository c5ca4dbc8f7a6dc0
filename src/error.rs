use std::time::Duration;

use thiserror::Error;

/// Library error type for motive discovery and serving.
#[derive(Debug, Error)]
pub enum Error {
    /// Every search attempt came back with an empty result page.
    #[error("no images found after {attempts} attempts")]
    NoResults { attempts: u32 },

    /// The result page had candidates, but none carried an original or large URL.
    #[error("none of the {candidates} candidates carried a usable image URL")]
    NoUsableImage { candidates: usize },

    /// Request or transport failure talking to the photo index.
    #[error("photo index request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The photo index answered with a body we could not decode.
    #[error("photo index response could not be decoded: {0}")]
    Decode(#[from] quick_xml::DeError),

    /// The photo index answered `stat="fail"`.
    #[error("photo index rejected the request ({code}): {message}")]
    Provider { code: String, message: String },

    /// A theme or query list is empty where one entry must be picked.
    #[error("empty configuration: {0}")]
    EmptyConfiguration(String),

    /// The prefetch producer is gone; no further pairs will arrive.
    #[error("prefetch producer stopped")]
    PrefetchClosed,

    /// No prefetched pair arrived within the configured wait.
    #[error("no prefetched motive within {0:?}")]
    PrefetchTimeout(Duration),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Themes file could not be parsed.
    #[error(transparent)]
    Themes(#[from] serde_json::Error),
}

impl Error {
    /// Failures talking to the photo index. These are never retried by the
    /// search client.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Decode(_) | Self::Provider { .. }
        )
    }
}
