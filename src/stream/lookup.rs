// SPDX-License-Identifier: MPL-2.0

use serde_json::Value;
use tracing::debug;

use super::ResolveError;

/// Candidate locations of the encrypted stream message, in preference order.
/// The page does not guarantee which bitrate entry is populated.
pub const MESSAGE_PATHS: [&str; 2] = [
    "/song/songDetail/tracks/0/urls/high/message",
    "/song/songDetail/tracks/0/urls/auto/message",
];

/// Decoded page data
#[derive(Debug, Clone)]
pub struct TrackRecord(Value);

impl TrackRecord {
    /// Parse an extracted object literal
    pub fn parse(literal: &str) -> Result<Self, ResolveError> {
        serde_json::from_str(literal)
            .map(Self)
            .map_err(|e| ResolveError::MalformedObject(e.to_string()))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// The first non-empty message found along [`MESSAGE_PATHS`]
    pub fn encrypted_message(&self) -> Result<&str, ResolveError> {
        locate(&self.0, &MESSAGE_PATHS)
    }
}

impl From<Value> for TrackRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Try each JSON pointer in order; a path that is missing, has the wrong
/// type, or ends in an empty string simply does not resolve.
pub fn locate<'a>(record: &'a Value, paths: &[&str]) -> Result<&'a str, ResolveError> {
    paths
        .iter()
        .find_map(|path| {
            let message = record
                .pointer(path)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())?;
            debug!(path, "encrypted message located");
            Some(message)
        })
        .ok_or(ResolveError::EncryptedFieldNotFound)
}
