//! OneMap access token cache and place search.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::client::ApiClient;
use super::types::{OneMapPlace, OneMapSearchResponse, OneMapToken};
use crate::error::{Error, Result};

/// Tokens are refreshed this many seconds before they expire.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Something that can mint a fresh OneMap token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Request a new token.
    async fn request_token(&self) -> Result<OneMapToken>;
}

#[async_trait]
impl TokenSource for ApiClient {
    async fn request_token(&self) -> Result<OneMapToken> {
        self.onemap_token().await
    }
}

/// Something that can geocode a place name with a OneMap token.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    /// First page of matches for `query`.
    async fn search_places(&self, query: &str, token: &str) -> Result<OneMapSearchResponse>;
}

#[async_trait]
impl PlaceSearch for ApiClient {
    async fn search_places(&self, query: &str, token: &str) -> Result<OneMapSearchResponse> {
        self.onemap_search(query, token).await
    }
}

/// Caches a OneMap token and refreshes it shortly before expiry.
///
/// Callers queue on an async mutex, so at most one refresh is in flight.
#[derive(Debug)]
pub struct OneMapAuth<S> {
    source: S,
    cached: Mutex<Option<OneMapToken>>,
}

impl<S: TokenSource> OneMapAuth<S> {
    /// Wrap a token source with an empty cache.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            cached: Mutex::new(None),
        }
    }

    /// A token valid for at least [`EXPIRY_MARGIN_SECS`] more seconds.
    ///
    /// # Errors
    ///
    /// Returns the source's error, or [`Error::Upstream`] when the token it
    /// returns is empty.
    pub async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cached.as_ref() {
            if now < token.expiry_timestamp - EXPIRY_MARGIN_SECS {
                debug!("Using cached OneMap token");
                return Ok(token.access_token.clone());
            }
        }

        let token = self.source.request_token().await?;
        if token.access_token.is_empty() {
            return Err(Error::upstream("no access_token in OneMap response"));
        }
        info!("OneMap token acquired, expires at {}", token.expiry_timestamp);
        let access = token.access_token.clone();
        *cached = Some(token);
        Ok(access)
    }

    /// Forget the cached token so the next call refreshes.
    pub async fn clear(&self) {
        *self.cached.lock().await = None;
    }
}

impl<S: TokenSource + PlaceSearch> OneMapAuth<S> {
    /// Geocode `query`, authenticating as needed.
    ///
    /// A token the server rejects with 401 is dropped and the search is
    /// retried once with a fresh one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PlaceNotFound`] for a blank query, or token and
    /// search errors.
    pub async fn search(&self, query: &str) -> Result<Vec<OneMapPlace>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::PlaceNotFound(String::new()));
        }

        let token = self.token().await?;
        let response = match self.source.search_places(query, &token).await {
            Err(Error::HttpStatus { status: 401, .. }) => {
                warn!("OneMap rejected the cached token, refreshing");
                self.clear().await;
                let token = self.token().await?;
                self.source.search_places(query, &token).await?
            }
            other => other?,
        };
        debug!("OneMap found {} matches for '{query}'", response.found);
        Ok(response.results)
    }

    /// The best match for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PlaceNotFound`] when nothing matches.
    pub async fn locate(&self, query: &str) -> Result<OneMapPlace> {
        self.search(query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::PlaceNotFound(query.trim().to_string()))
    }
}
