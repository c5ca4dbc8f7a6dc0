//! Wire layer for the Flickr REST photo index.
//!
//! `flickr.photos.search` answers with an XML document:
//!
//! ```xml
//! <rsp stat="ok">
//!   <photos page="1" pages="12" perpage="200" total="2400">
//!     <photo id="1" owner="..." url_o="..." width_o="1920" height_o="1080" url_l="..." .../>
//!   </photos>
//! </rsp>
//! ```
//!
//! or `<rsp stat="fail"><err code="100" msg="Invalid API Key"/></rsp>`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::Error;

pub const SEARCH_METHOD: &str = "flickr.photos.search";
/// Metadata extras requested with every search: both URL variants plus original dimensions.
pub const SEARCH_EXTRAS: &str = "url_l,url_o,o_dims";

/// Parameters of one photo search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub text: String,
    pub per_page: u32,
    pub getty_only: bool,
    pub safe_search: u8,
}

impl SearchRequest {
    /// Query pairs for the REST call, excluding the API key.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("method", SEARCH_METHOD.to_string()),
            ("text", self.text.clone()),
            ("per_page", self.per_page.to_string()),
            ("safe_search", self.safe_search.to_string()),
            ("extras", SEARCH_EXTRAS.to_string()),
        ];
        if self.getty_only {
            pairs.push(("is_getty", "true".to_string()));
        }
        pairs
    }
}

/// Top-level `<rsp>` element.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "@stat", default)]
    pub stat: String,
    #[serde(default)]
    pub photos: Option<PhotoPage>,
    #[serde(default)]
    pub err: Option<ProviderFailure>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotoPage {
    #[serde(rename = "@page", default)]
    pub page: u32,
    #[serde(rename = "@pages", default)]
    pub pages: u32,
    #[serde(rename = "@perpage", default)]
    pub per_page: u32,
    #[serde(rename = "@total", default)]
    pub total: u64,
    #[serde(rename = "photo", default)]
    pub photos: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderFailure {
    #[serde(rename = "@code", default)]
    pub code: String,
    #[serde(rename = "@msg", default)]
    pub message: String,
}

impl SearchResponse {
    /// Parse a response body.
    ///
    /// # Errors
    /// Returns [`Error::Decode`] when the body is not a well-formed `<rsp>`.
    pub fn from_xml(body: &str) -> Result<Self, Error> {
        Ok(quick_xml::de::from_str(body)?)
    }

    /// The candidates of a successful response.
    ///
    /// # Errors
    /// Returns [`Error::Provider`] unless the index answered `stat="ok"`.
    pub fn into_candidates(self) -> Result<Vec<Candidate>, Error> {
        match self.stat.as_str() {
            "ok" => Ok(self.photos.map(|page| page.photos).unwrap_or_default()),
            "fail" => {
                let failure = self.err.unwrap_or_default();
                Err(Error::Provider {
                    code: failure.code,
                    message: failure.message,
                })
            }
            other => Err(Error::Provider {
                code: String::new(),
                message: format!("unexpected response status '{other}'"),
            }),
        }
    }
}

/// One raw search hit before it is resolved to a displayable image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Candidate {
    #[serde(rename = "@id", default)]
    pub id: String,
    #[serde(rename = "@owner", default)]
    pub owner: String,
    #[serde(rename = "@secret", default)]
    pub secret: String,
    #[serde(rename = "@server", default)]
    pub server: String,
    #[serde(rename = "@farm", default)]
    pub farm: u32,
    #[serde(rename = "@title", default)]
    pub title: String,
    #[serde(rename = "@ispublic", default)]
    pub is_public: u8,
    #[serde(rename = "@isfriend", default)]
    pub is_friend: u8,
    #[serde(rename = "@isfamily", default)]
    pub is_family: u8,
    #[serde(rename = "@url_o", default)]
    pub url_o: Option<String>,
    #[serde(rename = "@width_o", default)]
    pub width_o: Option<u32>,
    #[serde(rename = "@height_o", default)]
    pub height_o: Option<u32>,
    #[serde(rename = "@url_l", default)]
    pub url_l: Option<String>,
    #[serde(rename = "@width_l", default)]
    pub width_l: Option<u32>,
    #[serde(rename = "@height_l", default)]
    pub height_l: Option<u32>,
}

/// A single resolution of a candidate's image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageVariant<'a> {
    pub url: &'a str,
    pub width: u32,
    pub height: u32,
}

impl ImageVariant<'_> {
    #[must_use]
    pub const fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

impl Candidate {
    /// The "original" variant, absent when its URL is missing or blank.
    #[must_use]
    pub fn original(&self) -> Option<ImageVariant<'_>> {
        variant(self.url_o.as_deref(), self.width_o, self.height_o)
    }

    /// The "large" variant, absent when its URL is missing or blank.
    #[must_use]
    pub fn large(&self) -> Option<ImageVariant<'_>> {
        variant(self.url_l.as_deref(), self.width_l, self.height_l)
    }
}

fn variant(
    url: Option<&str>,
    width: Option<u32>,
    height: Option<u32>,
) -> Option<ImageVariant<'_>> {
    let url = url.map(str::trim).filter(|u| !u.is_empty())?;
    Some(ImageVariant {
        url,
        width: width.unwrap_or(0),
        height: height.unwrap_or(0),
    })
}

/// A photo index that can answer one search request.
#[async_trait]
pub trait PhotoIndex: Send + Sync {
    /// Run a single search and return its candidates in result order.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Candidate>, Error>;
}

/// Flickr REST client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct FlickrIndex {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl FlickrIndex {
    /// # Errors
    /// Returns [`Error::Transport`] if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl PhotoIndex for FlickrIndex {
    #[instrument(skip(self, request), fields(text = %request.text))]
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Candidate>, Error> {
        let mut query = request.query_pairs();
        query.push(("api_key", self.api_key.clone()));
        let body = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let candidates = SearchResponse::from_xml(&body)?.into_candidates()?;
        debug!(candidates = candidates.len(), "photo index answered");
        Ok(candidates)
    }
}
