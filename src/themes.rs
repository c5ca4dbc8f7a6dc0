//! Theme store: the list of motives a page can show, loaded from a JSON file.

use std::path::Path;
use std::sync::Arc;

use rand::Rng;
use serde::Deserialize;
use tracing::debug;

use crate::error::Error;

/// A named subject with the search terms used to find a photo for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Theme {
    pub title: String,
    #[serde(default)]
    pub descriptions: Vec<String>,
    pub queries: Vec<String>,
}

/// How a theme's queries become the free-text search string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryMode {
    /// All queries joined with `", "`.
    #[default]
    Joined,
    /// One query drawn uniformly per search.
    Single,
}

impl Theme {
    /// All queries joined into one search string.
    #[must_use]
    pub fn joined_queries(&self) -> String {
        self.queries.join(", ")
    }

    /// Build the search text for this theme according to `mode`.
    ///
    /// # Errors
    /// Returns [`Error::EmptyConfiguration`] if the theme has no queries.
    pub fn query_text<R: Rng + ?Sized>(
        &self,
        mode: QueryMode,
        rng: &mut R,
    ) -> Result<String, Error> {
        match mode {
            QueryMode::Joined if self.queries.is_empty() => Err(self.no_queries()),
            QueryMode::Joined => Ok(self.joined_queries()),
            QueryMode::Single => random_query(self, rng).map(str::to_owned),
        }
    }

    fn no_queries(&self) -> Error {
        Error::EmptyConfiguration(format!("theme '{}' has no queries", self.title))
    }
}

/// Pick one theme uniformly at random.
///
/// # Errors
/// Returns [`Error::EmptyConfiguration`] if `themes` is empty.
pub fn random_theme<'a, T, R>(themes: &'a [T], rng: &mut R) -> Result<&'a T, Error>
where
    R: Rng + ?Sized,
{
    if themes.is_empty() {
        return Err(Error::EmptyConfiguration("theme list is empty".into()));
    }
    Ok(&themes[rng.random_range(0..themes.len())])
}

/// Pick one of the theme's queries uniformly at random.
///
/// # Errors
/// Returns [`Error::EmptyConfiguration`] if the theme has no queries.
pub fn random_query<'a, R>(theme: &'a Theme, rng: &mut R) -> Result<&'a str, Error>
where
    R: Rng + ?Sized,
{
    if theme.queries.is_empty() {
        return Err(theme.no_queries());
    }
    Ok(theme.queries[rng.random_range(0..theme.queries.len())].as_str())
}

#[derive(Debug, Deserialize)]
struct ThemesFile {
    #[serde(default)]
    flickr: Option<ProviderSection>,
    #[serde(default)]
    motives: Vec<Theme>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderSection {
    #[serde(default)]
    api_key: Option<String>,
}

/// Validated, immutable list of themes.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    themes: Vec<Arc<Theme>>,
    api_key: Option<String>,
}

impl ThemeStore {
    /// Build a store, rejecting an empty list or themes without queries.
    ///
    /// Queries are trimmed and blank ones dropped, so every stored query is
    /// usable as search text.
    ///
    /// # Errors
    /// Returns [`Error::EmptyConfiguration`] naming the offending theme.
    pub fn new(themes: Vec<Theme>) -> Result<Self, Error> {
        if themes.is_empty() {
            return Err(Error::EmptyConfiguration("theme list is empty".into()));
        }
        let mut stored = Vec::with_capacity(themes.len());
        for mut theme in themes {
            theme.queries = theme
                .queries
                .iter()
                .map(|q| q.trim())
                .filter(|q| !q.is_empty())
                .map(str::to_owned)
                .collect();
            if theme.queries.is_empty() {
                return Err(theme.no_queries());
            }
            stored.push(Arc::new(theme));
        }
        Ok(Self {
            themes: stored,
            api_key: None,
        })
    }

    /// Parse the JSON themes document.
    ///
    /// # Errors
    /// Returns [`Error::Themes`] on malformed JSON and
    /// [`Error::EmptyConfiguration`] on an unusable theme list.
    pub fn from_json_str(s: &str) -> Result<Self, Error> {
        let file: ThemesFile = serde_json::from_str(s)?;
        let mut store = Self::new(file.motives)?;
        store.api_key = file
            .flickr
            .and_then(|section| section.api_key)
            .filter(|key| !key.trim().is_empty());
        Ok(store)
    }

    /// Read and parse a JSON themes file.
    ///
    /// # Errors
    /// See [`ThemeStore::from_json_str`]; IO failures surface as [`Error::Io`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&s)?;
        debug!(
            path = %path.display(),
            titles = ?store.as_slice().iter().map(|t| t.title.as_str()).collect::<Vec<_>>(),
            "loaded themes"
        );
        Ok(store)
    }

    /// API key carried in the themes file, if any.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.themes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    /// Pick one theme uniformly at random.
    ///
    /// # Errors
    /// Unreachable for a store built through [`ThemeStore::new`]; kept for the
    /// shared contract with [`random_theme`].
    pub fn random_theme<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Arc<Theme>, Error> {
        random_theme(&self.themes, rng).cloned()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Arc<Theme>] {
        &self.themes
    }
}
