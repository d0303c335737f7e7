//! Record and DataBatch - HTTP input
//!
//! The atomic `{name, value}` unit and the batch envelope it arrives in.

use serde::{Deserialize, Serialize};

use crate::inserter::Row;
use crate::ContractError;

/// Single data point
///
/// `name` is expected to be non-empty but is not validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub value: f64,
}

impl Record {
    /// Create a record
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Render the record as the Pub/Sub message body (`{"name":..,"value":..}`)
    pub fn to_payload(&self) -> Result<String, ContractError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Render the record as a warehouse row
    pub fn to_row(&self) -> Result<Row, ContractError> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(ContractError::Other(format!(
                "record rendered to non-object json: {other}"
            ))),
        }
    }
}

/// Request envelope: `{ "items": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataBatch {
    pub items: Vec<Record>,
}

impl DataBatch {
    pub fn new(items: Vec<Record>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<Vec<Record>> for DataBatch {
    fn from(items: Vec<Record>) -> Self {
        Self { items }
    }
}
