// SPDX-License-Identifier: MPL-2.0

//! Locates the object literal a song page assigns to its data anchor.
//!
//! The page carries `window.REDUX_DATA = {...};</script>`. Neither the first
//! `}` nor a trailing `;</script>` marks the end of that object reliably,
//! because lyrics and nested URL objects contain both. The scanner walks the
//! object one byte at a time and stops where nesting depth returns to zero.

use super::ResolveError;

/// Anchor preceding the embedded page data
pub const REDUX_ANCHOR: &str = "window.REDUX_DATA = ";

/// How braces are counted while scanning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanMode {
    /// Braces inside double-quoted strings are ignored
    #[default]
    StringAware,
    /// Every `{` and `}` counts, quoted or not
    BraceCount,
}

/// Byte range of a balanced object literal inside a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedObjectSpan {
    pub start: usize,
    pub end: usize,
}

impl EmbeddedObjectSpan {
    pub fn slice<'a>(&self, document: &'a str) -> &'a str {
        &document[self.start..self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Return the balanced object literal that follows `anchor` in `document`
pub fn extract<'a>(document: &'a str, anchor: &str) -> Result<&'a str, ResolveError> {
    extract_with(document, anchor, ScanMode::default())
}

pub fn extract_with<'a>(
    document: &'a str,
    anchor: &str,
    mode: ScanMode,
) -> Result<&'a str, ResolveError> {
    find_span(document, anchor, mode).map(|span| span.slice(document))
}

/// Find the span of the object literal following the first `anchor`
pub fn find_span(
    document: &str,
    anchor: &str,
    mode: ScanMode,
) -> Result<EmbeddedObjectSpan, ResolveError> {
    let anchor_at = document.find(anchor).ok_or(ResolveError::AnchorNotFound)?;
    let after = anchor_at + anchor.len();
    let bytes = document.as_bytes();

    let start = after
        + bytes[after..]
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .ok_or(ResolveError::UnterminatedObject)?;
    if bytes[start] != b'{' {
        return Err(ResolveError::MalformedObject(
            "anchor is not followed by an object".into(),
        ));
    }

    // Only ASCII bytes are inspected, so every boundary found is a char boundary.
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' if mode == ScanMode::StringAware => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(EmbeddedObjectSpan {
                        start,
                        end: start + offset + 1,
                    });
                }
            }
            _ => {}
        }
    }

    Err(ResolveError::UnterminatedObject)
}
