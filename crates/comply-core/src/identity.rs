//! # Identifier Newtypes
//!
//! Distinct types for the two identifier spaces in the stack — you cannot
//! pass a [`SubjectId`] where a [`RecordId`] is expected. Record ids are
//! UUID-based and always valid by construction; subject ids are opaque
//! strings owned by whatever HR system feeds the store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for a compliance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new random record identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a record identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

/// An opaque employee identifier, as issued by the upstream HR system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(String);

impl SubjectId {
    /// Wrap an upstream employee identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Access the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SubjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_display_roundtrip() {
        let id = RecordId::new();
        let parsed: RecordId = id.to_string().parse().expect("parse");
        assert_eq!(parsed, id);
    }

    #[test]
    fn record_id_serde_is_plain_uuid() {
        let id = RecordId::from_uuid(Uuid::nil());
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }

    #[test]
    fn subject_id_preserves_raw_value() {
        let id = SubjectId::new("EMP-0042");
        assert_eq!(id.as_str(), "EMP-0042");
        assert_eq!(id.to_string(), "EMP-0042");
    }
}
