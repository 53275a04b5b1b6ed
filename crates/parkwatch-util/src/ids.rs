//! Strongly-typed identifiers for parkwatch

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a parking slot, stable for the lifetime of an occupancy
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(String);

impl SlotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SlotId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SlotId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_id_equality() {
        let id1 = SlotId::new("slot-a1");
        let id2 = SlotId::new("slot-a1");
        let id3 = SlotId::new("slot-a2");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn slot_id_serializes_as_plain_string() {
        let id = SlotId::new("clx0abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"clx0abc\"");

        let parsed: SlotId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
