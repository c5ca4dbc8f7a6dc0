use std::sync::Arc;

use tracing::info;

use crate::error::Error;
use crate::search::{PhotoSearch, SharedRng, with_rng};
use crate::selection::SelectedImage;
use crate::themes::{QueryMode, Theme, ThemeStore};

/// A theme paired with the image found for it, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMotive {
    pub theme: Arc<Theme>,
    pub query: String,
    pub image: SelectedImage,
}

/// Picks a random theme and resolves it to an image.
pub struct MotiveMaker {
    themes: Arc<ThemeStore>,
    search: Arc<PhotoSearch>,
    mode: QueryMode,
    rng: SharedRng,
}

impl MotiveMaker {
    pub fn new(
        themes: Arc<ThemeStore>,
        search: Arc<PhotoSearch>,
        mode: QueryMode,
        rng: SharedRng,
    ) -> Self {
        Self {
            themes,
            search,
            mode,
            rng,
        }
    }

    /// # Errors
    /// Propagates every failure of theme selection and of the photo search.
    pub async fn make(&self) -> Result<PreparedMotive, Error> {
        let (theme, query) = with_rng(&self.rng, |rng| {
            let theme = self.themes.random_theme(rng)?;
            let query = theme.query_text(self.mode, rng)?;
            Ok::<_, Error>((theme, query))
        })?;
        let image = self.search.search(&query).await?;
        info!(theme = %theme.title, %query, url = %image.url, "prepared motive");
        Ok(PreparedMotive {
            theme,
            query,
            image,
        })
    }
}
