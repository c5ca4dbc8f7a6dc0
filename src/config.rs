use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;

use crate::search::SearchOptions;
use crate::tasks::prefetch::Backoff;
use crate::themes::{QueryMode, ThemeStore};

/// Environment variable consulted when `search.api-key` is not set.
pub const API_KEY_ENV: &str = "MOTDAY_API_KEY";

pub const DEFAULT_ENDPOINT: &str = "https://api.flickr.com/services/rest/";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Address the page server binds to.
    pub listen_address: SocketAddr,
    /// JSON file holding the motives.
    pub themes_path: PathBuf,
    /// Optional HTML template; the built-in layout is used when absent.
    pub template_path: Option<PathBuf>,
    /// Seed for the process-wide random source (random when absent).
    pub random_seed: Option<u64>,
    /// How a theme's queries are turned into search text.
    pub query_mode: QueryMode,
    pub search: SearchSettings,
    pub prefetch: PrefetchSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct SearchSettings {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Candidates requested per search (single page).
    pub per_page: u32,
    /// Attempts made while the index keeps answering with an empty page.
    pub retries: u32,
    /// Restrict results to licensable content.
    pub getty_only: bool,
    /// Provider safe-search level (1 = safe, 2 = moderate, 3 = restricted).
    pub safe_search: u8,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PrefetchSettings {
    /// When false every page request searches on the request path.
    pub enabled: bool,
    /// Prepared motives buffered ahead of demand.
    pub capacity: usize,
    /// Upper bound on how long a request waits for a prepared motive.
    #[serde(with = "humantime_serde")]
    pub wait_timeout: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub backoff_initial: Duration,
    #[serde(with = "humantime_serde")]
    pub backoff_max: Duration,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_yaml::from_str(&s)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        self.search.validate()?;
        self.prefetch.validate()?;
        Ok(self)
    }

    /// Resolve the API key: config first, then [`API_KEY_ENV`], then the themes file.
    pub fn resolve_api_key(&self, themes: &ThemeStore) -> Result<String> {
        let env = std::env::var(API_KEY_ENV).ok();
        pick_api_key(self.search.api_key.as_deref(), env.as_deref(), themes.api_key())
    }
}

fn pick_api_key(
    configured: Option<&str>,
    env: Option<&str>,
    themes_file: Option<&str>,
) -> Result<String> {
    for candidate in [configured, env, themes_file].into_iter().flatten() {
        let trimmed = candidate.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }
    bail!(
        "no API key configured (search.api-key, {API_KEY_ENV}, or flickr.apiKey in the themes file)"
    )
}

impl SearchSettings {
    fn validate(&self) -> Result<()> {
        ensure!(!self.endpoint.trim().is_empty(), "search.endpoint must not be blank");
        ensure!(
            (1..=500).contains(&self.per_page),
            "search.per-page must be between 1 and 500"
        );
        ensure!(self.retries >= 1, "search.retries must be at least 1");
        ensure!(
            (1..=3).contains(&self.safe_search),
            "search.safe-search must be 1, 2 or 3"
        );
        ensure!(
            self.request_timeout > Duration::ZERO,
            "search.request-timeout must be positive"
        );
        Ok(())
    }

    #[must_use]
    pub const fn options(&self) -> SearchOptions {
        SearchOptions {
            per_page: self.per_page,
            retries: self.retries,
            getty_only: self.getty_only,
            safe_search: self.safe_search,
        }
    }
}

impl PrefetchSettings {
    fn validate(&self) -> Result<()> {
        ensure!(self.capacity >= 1, "prefetch.capacity must be at least 1");
        ensure!(
            self.backoff_initial > Duration::ZERO,
            "prefetch.backoff-initial must be positive"
        );
        ensure!(
            self.backoff_max >= self.backoff_initial,
            "prefetch.backoff-max must not be shorter than prefetch.backoff-initial"
        );
        if let Some(wait) = self.wait_timeout {
            ensure!(wait > Duration::ZERO, "prefetch.wait-timeout must be positive");
        }
        Ok(())
    }

    #[must_use]
    pub const fn backoff(&self) -> Backoff {
        Backoff {
            initial: self.backoff_initial,
            max: self.backoff_max,
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            listen_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            themes_path: PathBuf::from("config.json"),
            template_path: None,
            random_seed: None,
            query_mode: QueryMode::default(),
            search: SearchSettings::default(),
            prefetch: PrefetchSettings::default(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        let defaults = SearchOptions::default();
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            per_page: defaults.per_page,
            retries: defaults.retries,
            getty_only: defaults.getty_only,
            safe_search: defaults.safe_search,
            request_timeout: Duration::from_secs(10),
            user_agent: concat!("motday/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for PrefetchSettings {
    fn default() -> Self {
        let backoff = Backoff::default();
        Self {
            enabled: true,
            capacity: 1,
            wait_timeout: None,
            backoff_initial: backoff.initial,
            backoff_max: backoff.max,
        }
    }
}
