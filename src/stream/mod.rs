// SPDX-License-Identifier: MPL-2.0

//! Song identifier to playable stream URL.
//!
//! A song page embeds its data as `window.REDUX_DATA = {...}`. Resolution
//! fetches the page, cuts that object out, decodes it, finds the encrypted
//! stream message and decrypts it. Only the fetch suspends; every later stage
//! is a pure function of the page text.

mod coalesce;
pub mod decrypt;
mod error;
pub mod extract;
pub mod lookup;
mod normalize;

use tracing::{debug, info};

use crate::config::Config;

pub use coalesce::Coalescing;
pub use decrypt::{CIPHER_MATERIAL, CipherMaterial};
pub use error::{DecryptStage, FailureKind, FetchError, ResolveError};
pub use extract::{EmbeddedObjectSpan, REDUX_ANCHOR, ScanMode};
pub use lookup::TrackRecord;
pub use normalize::{ResolvedStreamUrl, normalize};

/// Retrieves the raw page text for a URL
pub trait DocumentFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Run every stage after the fetch over one song page
pub fn resolve_document(document: &str) -> Result<ResolvedStreamUrl, ResolveError> {
    let span = extract::find_span(document, REDUX_ANCHOR, ScanMode::StringAware)?;
    debug!(bytes = span.len(), "embedded object extracted");

    let record = TrackRecord::parse(span.slice(document))?;
    let message = record.encrypted_message()?;
    let plaintext = decrypt::decrypt(message, &CIPHER_MATERIAL)?;

    Ok(ResolvedStreamUrl::from(plaintext))
}

/// Resolves song identifiers through an injected fetcher
pub struct Resolver<F> {
    fetcher: F,
    song_page_base: String,
}

impl<F: DocumentFetcher> Resolver<F> {
    pub fn new(fetcher: F, config: &Config) -> Self {
        Self {
            fetcher,
            song_page_base: config.song_page_base.clone(),
        }
    }

    /// Song page URL for an identifier
    pub fn song_url(&self, identifier: &str) -> String {
        format!("{}{}", self.song_page_base, urlencoding::encode(identifier))
    }

    pub async fn resolve(&self, identifier: &str) -> Result<ResolvedStreamUrl, ResolveError> {
        if identifier.trim().is_empty() {
            return Err(ResolveError::EmptyIdentifier);
        }

        let url = self.song_url(identifier);
        debug!(%url, "fetching song page");
        let document = self.fetcher.fetch(&url).await?;
        debug!(bytes = document.len(), "song page fetched");

        let resolved = resolve_document(&document)?;
        info!(identifier, "stream resolved");
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeFetcher {
        pages: HashMap<String, Result<String, FetchError>>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn new(pages: impl IntoIterator<Item = (&'static str, Result<String, FetchError>)>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|(k, v)| (format!("https://gaana.com/song/{k}"), v))
                    .collect(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl DocumentFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .unwrap_or(Err(FetchError::Status(404)))
        }
    }

    fn page(urls: &str) -> String {
        format!(
            "<html><script>window.REDUX_DATA = {{\"song\":{{\"songDetail\":{{\"tracks\":[{{\"urls\":{urls}}}]}}}},\"lyrics\":\"}};</script>\"}};</script></html>"
        )
    }

    fn message(url: &str) -> String {
        decrypt::encrypt(url, &CIPHER_MATERIAL)
    }

    #[tokio::test]
    async fn resolves_and_upgrades_scheme() {
        let urls = format!(
            "{{\"high\":{{\"message\":\"{}\"}}}}",
            message("http://cdn.example.com/a.m3u8")
        );
        let resolver = Resolver::new(FakeFetcher::new([("tum-hi-ho", Ok(page(&urls)))]), &Config::default());

        let url = resolver.resolve("tum-hi-ho").await.unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/a.m3u8");
    }

    #[tokio::test]
    async fn falls_back_to_auto_bitrate() {
        let urls = format!(
            "{{\"auto\":{{\"message\":\"{}\"}}}}",
            message("https://cdn.example.com/auto.mp4")
        );
        let resolver = Resolver::new(FakeFetcher::new([("song", Ok(page(&urls)))]), &Config::default());

        let url = resolver.resolve("song").await.unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/auto.mp4");
    }

    #[tokio::test]
    async fn empty_identifier_is_not_fetched() {
        let fetcher = FakeFetcher::new([]);
        let resolver = Resolver::new(fetcher, &Config::default());
        assert_eq!(resolver.resolve("  ").await, Err(ResolveError::EmptyIdentifier));
        assert!(resolver.fetcher.requested.lock().unwrap().is_empty());
    }

    #[test]
    fn identifier_is_url_encoded() {
        let resolver = Resolver::new(FakeFetcher::new([]), &Config::default());
        assert_eq!(
            resolver.song_url("a b/c"),
            "https://gaana.com/song/a%20b%2Fc"
        );
    }

    #[tokio::test]
    async fn fetch_failure_passes_through() {
        let resolver = Resolver::new(
            FakeFetcher::new([("down", Err(FetchError::Transport("timed out".into())))]),
            &Config::default(),
        );
        assert_eq!(
            resolver.resolve("down").await,
            Err(ResolveError::FetchFailed(FetchError::Transport("timed out".into())))
        );
        assert_eq!(
            resolver.resolve("missing").await,
            Err(ResolveError::FetchFailed(FetchError::Status(404)))
        );
    }

    #[test]
    fn stage_failures_short_circuit() {
        assert_eq!(
            resolve_document("<html></html>"),
            Err(ResolveError::AnchorNotFound)
        );
        assert_eq!(
            resolve_document("window.REDUX_DATA = {\"song\":{"),
            Err(ResolveError::UnterminatedObject)
        );
        assert!(matches!(
            resolve_document("window.REDUX_DATA = {song: 1};"),
            Err(ResolveError::MalformedObject(_))
        ));
        assert_eq!(
            resolve_document(&page("{}")),
            Err(ResolveError::EncryptedFieldNotFound)
        );
        assert_eq!(
            resolve_document(&page("{\"high\":{\"message\":\"@@@\"}}")),
            Err(ResolveError::DecryptionFailed(DecryptStage::Base64))
        );
    }

    #[test]
    fn errors_do_not_leak_page_text() {
        let err = resolve_document("window.REDUX_DATA = {\"secret-lyrics\" oops};").unwrap_err();
        assert!(!err.to_string().contains("secret-lyrics"));
    }
}
