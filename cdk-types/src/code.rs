//! The redemption code value type.
//!
//! Codes are normalized exactly once, at the validation boundary: leading
//! and trailing whitespace is trimmed and the remainder is uppercased.
//! Every comparison in the flow uses the normalized form; the raw form is
//! kept only so it can be echoed back to the user unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalizes raw code input: trim surrounding whitespace, uppercase.
///
/// Idempotent: applying it twice equals applying it once.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// A redemption code (CDK) as entered by the user.
///
/// Immutable after construction. Holds both the raw input and its
/// normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Code {
    raw: String,
    normalized: String,
}

impl Code {
    /// Builds a code from raw user input, normalizing it.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            normalized: normalize(raw),
        }
    }

    /// Returns the raw input as the user typed it.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the normalized (trimmed, uppercased) form.
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Returns true if the code is empty after normalization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized)
    }
}
