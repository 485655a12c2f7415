// SPDX-License-Identifier: MPL-2.0

use serde::Serialize;
use std::fmt;

/// Playable stream URL handed back to callers. Never plain `http:`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedStreamUrl(String);

impl ResolvedStreamUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for ResolvedStreamUrl {
    fn from(plaintext: String) -> Self {
        Self(normalize(plaintext))
    }
}

impl fmt::Display for ResolvedStreamUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rewrite a leading `http:` to `https:` so an HTTPS page can load the stream.
/// Host, path and query are left untouched.
pub fn normalize(url: String) -> String {
    match url.strip_prefix("http:") {
        Some(rest) => format!("https:{rest}"),
        None => url,
    }
}
