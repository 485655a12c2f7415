// SPDX-License-Identifier: MPL-2.0

//! Ranked song listings and stream URL resolution for the Gaana catalog.

pub mod api;
pub mod config;
pub mod stream;

pub use api::{GaanaClient, TopTrack};
pub use config::Config;
pub use stream::{Coalescing, DocumentFetcher, FailureKind, ResolveError, ResolvedStreamUrl, Resolver};
