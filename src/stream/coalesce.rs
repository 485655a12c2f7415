// SPDX-License-Identifier: MPL-2.0

//! Opt-in sharing of in-flight resolutions.

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::{DocumentFetcher, ResolveError, ResolvedStreamUrl, Resolver};

type InFlight = Shared<BoxFuture<'static, Result<ResolvedStreamUrl, ResolveError>>>;

/// Wraps a [`Resolver`] so concurrent requests for one identifier share a
/// single fetch. Entries live only while the resolution is running; nothing
/// is cached once it finishes.
///
/// Each resolution runs on its own Tokio task, so it completes and leaves the
/// map even when every caller has dropped its future. `resolve` must therefore
/// be called from within a Tokio runtime.
pub struct Coalescing<F> {
    inner: Arc<Resolver<F>>,
    in_flight: Arc<Mutex<HashMap<String, InFlight>>>,
}

impl<F> Clone for Coalescing<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<F: DocumentFetcher + 'static> Coalescing<F> {
    pub fn new(resolver: Resolver<F>) -> Self {
        Self {
            inner: Arc::new(resolver),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn resolver(&self) -> &Resolver<F> {
        &self.inner
    }

    /// Number of identifiers currently being resolved
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    pub async fn resolve(&self, identifier: &str) -> Result<ResolvedStreamUrl, ResolveError> {
        let pending = {
            let mut in_flight = self.in_flight.lock();
            if let Some(pending) = in_flight.get(identifier).cloned() {
                debug!(identifier, "joining in-flight resolution");
                pending
            } else {
                let pending = self.start(identifier.to_owned());
                in_flight.insert(identifier.to_owned(), pending.clone());
                pending
            }
        };
        pending.await
    }

    /// Called with the map locked, so the eviction below cannot run before
    /// the caller has inserted the entry.
    fn start(&self, identifier: String) -> InFlight {
        let inner = Arc::clone(&self.inner);
        let evict = Evict {
            in_flight: Arc::clone(&self.in_flight),
            identifier,
        };
        let pending = async move {
            let result = inner.resolve(&evict.identifier).await;
            drop(evict);
            result
        }
        .boxed()
        .shared();
        tokio::spawn(pending.clone());
        pending
    }
}

/// Removes an identifier's entry when its resolution ends, including on panic
struct Evict {
    in_flight: Arc<Mutex<HashMap<String, InFlight>>>,
    identifier: String,
}

impl Drop for Evict {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.identifier);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::stream::{CIPHER_MATERIAL, FetchError, decrypt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct SlowFetcher {
        calls: AtomicUsize,
    }

    impl DocumentFetcher for SlowFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if url.ends_with("/broken") {
                return Err(FetchError::Status(500));
            }
            let message = decrypt::encrypt("http://cdn.example.com/x.mp4", &CIPHER_MATERIAL);
            Ok(format!(
                "window.REDUX_DATA = {{\"song\":{{\"songDetail\":{{\"tracks\":[{{\"urls\":{{\"high\":{{\"message\":\"{message}\"}}}}}}]}}}}}};"
            ))
        }
    }

    fn coalescing() -> Coalescing<SlowFetcher> {
        Coalescing::new(Resolver::new(
            SlowFetcher {
                calls: AtomicUsize::new(0),
            },
            &Config::default(),
        ))
    }

    fn calls(c: &Coalescing<SlowFetcher>) -> usize {
        c.resolver().fetcher.calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_fetch() {
        let c = coalescing();
        let (a, b, other) = tokio::join!(c.resolve("song"), c.resolve("song"), c.resolve("other"));

        assert_eq!(a.unwrap().as_str(), "https://cdn.example.com/x.mp4");
        assert_eq!(b.unwrap().as_str(), "https://cdn.example.com/x.mp4");
        assert!(other.is_ok());
        assert_eq!(calls(&c), 2);
        assert_eq!(c.in_flight(), 0);
    }

    #[tokio::test]
    async fn finished_resolutions_are_not_cached() {
        let c = coalescing();
        c.resolve("song").await.unwrap();
        c.resolve("song").await.unwrap();
        assert_eq!(calls(&c), 2);
    }

    #[tokio::test]
    async fn failures_are_shared_too() {
        let c = coalescing();
        let (a, b) = tokio::join!(c.resolve("broken"), c.resolve("broken"));
        assert_eq!(a, Err(ResolveError::FetchFailed(FetchError::Status(500))));
        assert_eq!(a, b);
        assert_eq!(calls(&c), 1);
    }

    #[tokio::test]
    async fn cancelled_callers_do_not_pin_entries() {
        let c = coalescing();
        for i in 0..10 {
            let attempt =
                tokio::time::timeout(Duration::from_millis(1), c.resolve(&format!("song-{i}"))).await;
            assert!(attempt.is_err());
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(c.in_flight(), 0);
        assert_eq!(calls(&c), 10);
    }

    #[tokio::test]
    async fn later_caller_joins_resolution_abandoned_by_earlier_one() {
        let c = coalescing();
        assert!(
            tokio::time::timeout(Duration::from_millis(1), c.resolve("song"))
                .await
                .is_err()
        );
        assert_eq!(c.in_flight(), 1);

        assert!(c.resolve("song").await.is_ok());
        assert_eq!(calls(&c), 1);
        assert_eq!(c.in_flight(), 0);
    }

    #[tokio::test]
    async fn works_across_tasks() {
        let c = coalescing();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = c.clone();
                tokio::spawn(async move { c.resolve("song").await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert!(calls(&c) >= 1);
        assert_eq!(c.in_flight(), 0);
    }
}
