//! Actor identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque actor tag such as `"admin:42"` or `"staff:7"`
///
/// Never resolved or interpreted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    pub const SYSTEM: &'static str = "system";

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn system() -> Self {
        Self(Self::SYSTEM.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Actor {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}
