use serde::{Deserialize, Serialize};

/// A single place as returned by the search endpoint.
///
/// The payload is kept verbatim; which attributes are present depends on the
/// field mask sent with the request. Nothing in gridsweep reads its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceRecord(serde_json::Value);

impl PlaceRecord {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for PlaceRecord {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}
