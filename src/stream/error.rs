// SPDX-License-Identifier: MPL-2.0

use serde::Serialize;
use thiserror::Error;

/// Failure reported by a [`DocumentFetcher`](super::DocumentFetcher)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server answered with a non-success status
    #[error("song page returned HTTP {0}")]
    Status(u16),
    /// Network, timeout or body read failure
    #[error("transport error: {0}")]
    Transport(String),
}

/// Which step of message decryption rejected the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptStage {
    Base64,
    Padding,
    Utf8,
    Empty,
}

impl std::fmt::Display for DecryptStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            Self::Base64 => "invalid base64",
            Self::Padding => "bad block length or padding",
            Self::Utf8 => "plaintext is not UTF-8",
            Self::Empty => "empty message",
        };
        f.write_str(stage)
    }
}

/// Stream resolution error
///
/// Messages name the failing stage only. They never include the fetched
/// document or any cipher material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("identifier must not be empty")]
    EmptyIdentifier,
    #[error("embedded data anchor not found in song page")]
    AnchorNotFound,
    #[error("embedded object is not terminated")]
    UnterminatedObject,
    #[error("embedded object is malformed: {0}")]
    MalformedObject(String),
    #[error("encrypted stream message not found")]
    EncryptedFieldNotFound,
    #[error("stream message decryption failed: {0}")]
    DecryptionFailed(DecryptStage),
    #[error("fetch failed: {0}")]
    FetchFailed(#[from] FetchError),
}

/// Coarse failure class callers map onto their own transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    BadInput,
    UpstreamFormatChanged,
    DecryptionFailed,
    FetchFailed,
}

impl ResolveError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::EmptyIdentifier => FailureKind::BadInput,
            Self::AnchorNotFound
            | Self::UnterminatedObject
            | Self::MalformedObject(_)
            | Self::EncryptedFieldNotFound => FailureKind::UpstreamFormatChanged,
            Self::DecryptionFailed(_) => FailureKind::DecryptionFailed,
            Self::FetchFailed(_) => FailureKind::FetchFailed,
        }
    }
}
