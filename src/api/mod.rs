// SPDX-License-Identifier: MPL-2.0

mod client;
mod types;

pub use client::{ApiError, GaanaClient};
pub use types::{Artist, LANGUAGES, Language, TopSongsResponse, TopTrack, rank};
