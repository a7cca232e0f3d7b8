use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a consumer.
///
/// Wraps a UUID to provide type safety and prevent mixing up
/// consumer IDs with other UUID-based identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsumerId(Uuid);

impl ConsumerId {
    /// Creates a new random consumer ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a consumer ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConsumerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ConsumerId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ConsumerId> for Uuid {
    fn from(id: ConsumerId) -> Self {
        id.0
    }
}

/// Unique identifier for a catalog asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(Uuid);

impl AssetId {
    /// Creates a new random asset ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an asset ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AssetId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<AssetId> for Uuid {
    fn from(id: AssetId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumer_id_new_creates_unique_ids() {
        let id1 = ConsumerId::new();
        let id2 = ConsumerId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn consumer_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = ConsumerId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn consumer_id_serialization_roundtrip() {
        let id = ConsumerId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: ConsumerId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn asset_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = AssetId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }
}
