//! Wire data model for the two verification calls.
//!
//! These structs mirror the gateway's JSON responses. Product-specific
//! fields arrive in `Identity::extra` and stay untyped here; policies in
//! the flow crate interpret them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of verifying a redemption code against the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeInfo {
    /// The code as the server recorded it.
    pub code: String,
    /// Whether the code has already been redeemed.
    pub used: bool,
    /// Application label, when the backend attaches one.
    #[serde(default)]
    pub app: Option<String>,
    /// Product label, when the backend attaches one.
    #[serde(default)]
    pub product: Option<String>,
}

/// A verified representation of the end-user's account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Subject identifier (account id, email, or username, per product).
    pub subject: String,
    /// Whether the credential verified against the product backend.
    pub verified: bool,
    /// Whether the backend itself accepts this identity for redemption.
    #[serde(default)]
    pub accepted: bool,
    /// Product-specific fields (e.g. `premium_type`, `plan`).
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Identity {
    /// Reads an integer field from `extra`, if present and numeric.
    #[must_use]
    pub fn extra_i64(&self, key: &str) -> Option<i64> {
        self.extra.get(key).and_then(serde_json::Value::as_i64)
    }

    /// Reads a string field from `extra`, if present.
    #[must_use]
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(serde_json::Value::as_str)
    }
}
