//! Entity identifiers.
//!
//! Sensor entities are keyed by the last segment of the channel they
//! publish on (a parking name, an access point id, a bus id). Keys are
//! unique within one [`Domain`](crate::Domain) only, so an [`EntityId`]
//! is always paired with its domain when used as a lookup key.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Identifier of one sensor or vehicle within a domain.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct EntityId(String);

impl EntityId {
    /// Wrap a raw key.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl From<String> for EntityId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_bare_string() {
        let id = EntityId::new("parking_gare");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"parking_gare\"");
    }

    #[test]
    fn orders_lexicographically() {
        let a = EntityId::from("AP001");
        let b = EntityId::from("AP002");
        assert!(a < b);
        assert_eq!(a.to_string(), "AP001");
    }
}
