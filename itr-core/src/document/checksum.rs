use std::fmt;

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a canonical payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentChecksum(String);

impl ContentChecksum {
    pub fn of(payload: &str) -> Self {
        Self(hex::encode(Sha256::digest(payload.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Case-insensitive comparison against a stored hex digest.
    pub fn matches(
        &self,
        stored: &str,
    ) -> bool {
        self.0.eq_ignore_ascii_case(stored.trim())
    }
}

impl fmt::Display for ContentChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
