//! Account identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The handle naming one account in the remote network.
///
/// This is the canonical identifier space for the whole crate: seed
/// files, the FF scan set, broken-account ledgers and output file names
/// all use screen names. Numeric account ids returned by the FF
/// endpoints are resolved to screen names at the endpoint boundary and
/// never reach the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenName(String);

impl ScreenName {
    /// Create a screen name, trimming surrounding whitespace and any
    /// leading `@`.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        Self(trimmed.strip_prefix('@').unwrap_or(trimmed).to_string())
    }

    /// The handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScreenName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
