// SPDX-License-Identifier: MPL-2.0

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A listing language offered by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub label: &'static str,
    pub code: &'static str,
}

pub const LANGUAGES: [Language; 5] = [
    Language { label: "Telugu", code: "telugu" },
    Language { label: "Hindi", code: "hindi" },
    Language { label: "English", code: "english" },
    Language { label: "Tamil", code: "tamil" },
    Language { label: "Kannada", code: "kannada" },
];

impl Language {
    pub fn from_code(code: &str) -> Option<Self> {
        LANGUAGES
            .iter()
            .copied()
            .find(|l| l.code.eq_ignore_ascii_case(code))
    }
}

/// Performing artist
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Artist {
    #[serde(default)]
    pub name: String,
}

/// One entry of a ranked listing
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TopTrack {
    /// Sent as a string or a number depending on the endpoint
    #[serde(default, deserialize_with = "string_or_number")]
    pub track_id: String,
    /// Identifier accepted by stream resolution
    #[serde(default)]
    pub seokey: String,
    #[serde(default)]
    pub track_title: String,
    #[serde(default)]
    pub album_title: String,
    pub artwork_large: Option<String>,
    pub release_date: Option<String>,
    /// `"<a>~<b>"`, where `b` is the popularity score
    pub popularity: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artist: Vec<Artist>,
}

impl TopTrack {
    /// Score after the `~` in `popularity`, or 0 when it cannot be read
    pub fn popularity_score(&self) -> i64 {
        match &self.popularity {
            Some(Value::String(raw)) => raw
                .split_once('~')
                .and_then(|(_, score)| score.trim().parse().ok())
                .unwrap_or(0),
            _ => 0,
        }
    }

    pub fn artist_names(&self) -> String {
        self.artist
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Year part of `release_date`
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()?
            .split('-')
            .next()?
            .trim()
            .parse()
            .ok()
    }

    /// Case-insensitive match against title, album and artist names
    pub fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let haystack = std::iter::once(self.track_title.as_str())
            .chain(std::iter::once(self.album_title.as_str()))
            .chain(self.artist.iter().map(|a| a.name.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        haystack.contains(&query.to_lowercase())
    }
}

/// Filter by `query`, then order by popularity, highest first.
/// Tracks with equal scores keep their listing order.
pub fn rank<'a>(tracks: &'a [TopTrack], query: &str) -> Vec<&'a TopTrack> {
    let mut visible: Vec<&TopTrack> = tracks.iter().filter(|t| t.matches(query)).collect();
    visible.sort_by_key(|t| std::cmp::Reverse(t.popularity_score()));
    visible
}

/// Ranked listing response
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TopSongsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tracks: Vec<TopTrack>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
