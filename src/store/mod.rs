mod memory;

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use self::memory::{MemoryStore, MemoryTable};
pub use crate::error::StoreError;

/// A connection to a key-value storage engine. One of these is created per
/// process and shared by every invocation of the handler.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Get a handle to the named table.
    async fn table(&self, name: &str) -> Result<Arc<dyn Table>, StoreError>;
}

/// A handle to one table in the storage engine.
#[async_trait]
pub trait Table: Send + Sync {
    /// Add `delta` to the numeric `field` of the record identified by `key`
    /// and return the updated value.
    ///
    /// Implementations must apply the update atomically with respect to
    /// other increments on the same record, and must treat a missing record
    /// or field as zero.
    async fn atomic_increment(
        &self,
        key: &Key,
        field: &str,
        delta: i64,
    ) -> Result<UpdateOutput, StoreError>;
}

/// Primary key of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    pub attribute: String,
    pub value: String,
}

impl Key {
    pub fn new(attribute: &str, value: &str) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

/// What the storage engine sent back for an update. Engines talk to us over
/// the network, so every part of this may be missing.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateOutput {
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
    /// Attributes touched by the update, with their new values.
    #[serde(default)]
    pub attributes: Option<HashMap<String, Value>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseMetadata {
    #[serde(default, rename = "HTTPStatusCode")]
    pub http_status_code: Option<u16>,
}

impl UpdateOutput {
    pub fn new(status_code: u16, field: &str, value: i64) -> Self {
        Self {
            response_metadata: Some(ResponseMetadata {
                http_status_code: Some(status_code),
            }),
            attributes: Some(HashMap::from([(field.to_string(), Value::from(value))])),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.response_metadata.as_ref()?.http_status_code
    }

    /// The new value of `field`. Engines that encode numbers as strings are
    /// accepted too, as long as the string is a plain integer.
    pub fn updated_value(&self, field: &str) -> Option<i64> {
        match self.attributes.as_ref()?.get(field)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}
