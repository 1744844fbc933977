//! Media identifiers and extraction from user input.
//!
//! A [`MediaId`] is the 11-character token naming a video on the upstream
//! platform. Both the server (path validation) and the client (playlist
//! input) go through the same syntactic check.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Exact length of a media identifier.
pub const MEDIA_ID_LEN: usize = 11;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&?/\s]+)")
        .expect("identifier URL pattern compiles")
});

/// Errors produced while validating or extracting identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Input was empty after trimming.
    #[error("empty input")]
    Empty,

    /// Token is not an 11-character `[A-Za-z0-9_-]` string.
    #[error("malformed media identifier: {value}")]
    Malformed {
        /// The rejected token
        value: String,
    },

    /// No known URL shape or bare identifier found in the input.
    #[error("no media identifier found in: {input}")]
    NotFound {
        /// The raw input that was searched
        input: String,
    },
}

/// Opaque, validated identifier of an external video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MediaId(String);

impl MediaId {
    /// Validates a bare identifier token.
    ///
    /// # Errors
    /// - `IdentifierError::Malformed` - Wrong length or characters outside `[A-Za-z0-9_-]`
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        if is_valid_token(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(IdentifierError::Malformed {
                value: value.to_string(),
            })
        }
    }

    /// Extracts an identifier from user input.
    ///
    /// Accepts `youtube.com/watch?v=`, `youtu.be/` and `youtube.com/embed/`
    /// URLs as well as a bare 11-character token.
    ///
    /// # Errors
    /// - `IdentifierError::Empty` - Input is blank
    /// - `IdentifierError::NotFound` - No URL shape matched with a valid token
    pub fn extract(input: &str) -> Result<Self, IdentifierError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(IdentifierError::Empty);
        }

        if let Some(captures) = URL_PATTERN.captures(input) {
            if let Some(token) = captures.get(1) {
                if let Ok(id) = Self::parse(token.as_str()) {
                    return Ok(id);
                }
            }
        }

        Self::parse(input).map_err(|_| IdentifierError::NotFound {
            input: input.to_string(),
        })
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch page URL, used as the resolver input and the client's
    /// external fallback link.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }

    /// Medium-quality still used for playlist rows.
    pub fn thumbnail_url(&self) -> String {
        format!("https://img.youtube.com/vi/{}/mqdefault.jpg", self.0)
    }
}

fn is_valid_token(value: &str) -> bool {
    value.len() == MEDIA_ID_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MediaId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MediaId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_valid_token(&value) {
            Ok(Self(value))
        } else {
            Err(IdentifierError::Malformed { value })
        }
    }
}

impl From<MediaId> for String {
    fn from(id: MediaId) -> Self {
        id.0
    }
}

impl AsRef<str> for MediaId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
