//! Photo search client: retry-on-empty around a [`PhotoIndex`], then image selection.

use std::sync::{Arc, Mutex, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, instrument, warn};

use crate::error::Error;
use crate::provider::{PhotoIndex, SearchRequest};
use crate::selection::{SelectedImage, select_image};

/// The process-wide random source, created once at startup.
pub type SharedRng = Arc<Mutex<StdRng>>;

/// Build the shared random source; a fixed `seed` makes every draw reproducible.
#[must_use]
pub fn shared_rng(seed: Option<u64>) -> SharedRng {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    Arc::new(Mutex::new(rng))
}

/// Run `f` with exclusive access to the shared random source.
pub fn with_rng<T>(rng: &SharedRng, f: impl FnOnce(&mut StdRng) -> T) -> T {
    let mut guard = rng.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut *guard)
}

/// Knobs for a single search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub per_page: u32,
    pub retries: u32,
    pub getty_only: bool,
    pub safe_search: u8,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            per_page: 200,
            retries: 10,
            getty_only: true,
            safe_search: 1,
        }
    }
}

pub struct PhotoSearch {
    index: Arc<dyn PhotoIndex>,
    options: SearchOptions,
    rng: SharedRng,
}

impl PhotoSearch {
    pub fn new(index: Arc<dyn PhotoIndex>, options: SearchOptions, rng: SharedRng) -> Self {
        Self {
            index,
            options,
            rng,
        }
    }

    /// Search for `query_text` and pick one image from the first non-empty page.
    ///
    /// Empty pages are retried up to `retries` times; any transport or decode
    /// failure aborts immediately.
    ///
    /// # Errors
    /// [`Error::NoResults`] once the retry budget is spent,
    /// [`Error::NoUsableImage`] if no candidate carries a URL, or the
    /// transport-class error reported by the index.
    #[instrument(skip(self))]
    pub async fn search(&self, query_text: &str) -> Result<SelectedImage, Error> {
        let request = SearchRequest {
            text: query_text.to_owned(),
            per_page: self.options.per_page,
            getty_only: self.options.getty_only,
            safe_search: self.options.safe_search,
        };
        let retries = self.options.retries.max(1);
        for attempt in 1..=retries {
            let candidates = self.index.search(&request).await?;
            if candidates.is_empty() {
                warn!(attempt, retries, "no images found; retrying");
                continue;
            }
            let picked = with_rng(&self.rng, |rng| select_image(&candidates, rng));
            return match picked {
                Some(image) => {
                    debug!(
                        attempt,
                        candidates = candidates.len(),
                        url = %image.url,
                        width = image.width,
                        height = image.height,
                        "selected image"
                    );
                    Ok(image)
                }
                None => Err(Error::NoUsableImage {
                    candidates: candidates.len(),
                }),
            };
        }
        Err(Error::NoResults { attempts: retries })
    }
}
