//! Device identifier (id0) validation.
//!
//! An id0 is 32 hexadecimal digits. Matching is case-insensitive and the
//! identifier is stored lowercased, so every spelling of one device maps to
//! the same job and artifact.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

static ID0_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-fA-F0-9]{32}$").expect("valid regex"));

/// Returns `true` if `value` is a well-formed id0.
pub fn is_id0(value: &str) -> bool {
    ID0_RE.is_match(value)
}

/// A validated 32-hex-digit device identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Id0(String);

impl Id0 {
    /// Validate an identifier and canonicalize it to lowercase.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        if is_id0(value) {
            Ok(Self(value.to_ascii_lowercase()))
        } else {
            Err(CoreError::Validation("Invalid ID0".to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id0 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Id0 {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Id0> for String {
    fn from(id0: Id0) -> Self {
        id0.0
    }
}

impl AsRef<str> for Id0 {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
