// SPDX-License-Identifier: MPL-2.0

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{TopSongsResponse, TopTrack};
use crate::config::Config;
use crate::stream::{DocumentFetcher, FetchError};

/// Catalog API error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog API failed with status {0}")]
    Status(u16),
}

/// Gaana catalog client
#[derive(Clone)]
pub struct GaanaClient {
    http: Client,
    listing_api_base: String,
    listing_limit: u32,
}

impl GaanaClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            listing_api_base: config.listing_api_base.clone(),
            listing_limit: config.listing_limit,
        })
    }

    /// Build the most-popular listing URL for a language
    pub fn top_songs_url(&self, language: &str) -> String {
        format!(
            "{}?type=song&subtype=most_popular&format=JSON&order=alltime&language={}&limit=0,{}",
            self.listing_api_base,
            urlencoding::encode(language),
            self.listing_limit
        )
    }

    /// All-time most popular tracks for a language, in catalog order
    pub async fn top_songs(&self, language: &str) -> Result<Vec<TopTrack>, ApiError> {
        let url = self.top_songs_url(language);
        debug!(%url, "fetching top songs");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), language, "top songs request failed");
            return Err(ApiError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        let listing: TopSongsResponse = serde_json::from_str(&text)?;
        debug!(language, tracks = listing.tracks.len(), "top songs loaded");
        Ok(listing.tracks)
    }
}

impl DocumentFetcher for GaanaClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.without_url().to_string()))
    }
}
