//! Outcome types - Ingest coordinator output
//!
//! Per-record publish outcomes, per-row insert errors and the merged result.

use serde::{Deserialize, Serialize};

/// Result of publishing one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishOutcome {
    Success { message_id: String },
    Error { error: String },
}

impl PublishOutcome {
    pub fn success(message_id: impl Into<String>) -> Self {
        Self::Success {
            message_id: message_id.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn message_id(&self) -> Option<&str> {
        match self {
            Self::Success { message_id } => Some(message_id),
            Self::Error { .. } => None,
        }
    }
}

/// One entry of a rejected insert
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(
        default,
        rename = "debugInfo",
        skip_serializing_if = "Option::is_none"
    )]
    pub debug_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Insert error descriptor
///
/// Serialized untagged so both shapes match what the warehouse client reports:
/// `{"index": 0, "errors": [...]}` for a rejected row and `{"error": "..."}`
/// for a whole-call fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsertErrorDescriptor {
    /// Row at `index` was rejected
    Row {
        index: u64,
        #[serde(default)]
        errors: Vec<RowErrorDetail>,
    },
    /// The call itself failed; no row is known to be written
    Fault { error: String },
}

impl InsertErrorDescriptor {
    pub fn fault(error: impl Into<String>) -> Self {
        Self::Fault {
            error: error.into(),
        }
    }
}

/// Overall batch status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    Success,
    PartialSuccess,
}

/// Merged outcome of one batch
#[derive(Debug, Clone, PartialEq)]
pub struct IngestResult {
    /// Overall status (see `StatusPolicy`)
    pub status: IngestStatus,

    /// Always the batch length
    pub processed_count: usize,

    /// One entry per record, in batch order
    pub publish_outcomes: Vec<PublishOutcome>,

    /// `None` when the insert reported no errors
    pub insert_errors: Option<Vec<InsertErrorDescriptor>>,
}

impl IngestResult {
    /// Number of records whose publish failed
    pub fn publish_failures(&self) -> usize {
        self.publish_outcomes
            .iter()
            .filter(|o| !o.is_success())
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.status == IngestStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_outcome_wire_shape() {
        let ok = serde_json::to_value(PublishOutcome::success("m1")).unwrap();
        assert_eq!(ok, json!({"status": "success", "message_id": "m1"}));

        let err = serde_json::to_value(PublishOutcome::error("boom")).unwrap();
        assert_eq!(err, json!({"status": "error", "error": "boom"}));
    }

    #[test]
    fn test_fault_descriptor_wire_shape() {
        let value = serde_json::to_value(InsertErrorDescriptor::fault("timeout")).unwrap();
        assert_eq!(value, json!({"error": "timeout"}));
    }

    #[test]
    fn test_row_descriptor_from_warehouse_response() {
        let raw = json!({
            "index": 1,
            "errors": [{
                "reason": "invalid",
                "location": "value",
                "debugInfo": "",
                "message": "Cannot convert value to floating point."
            }]
        });
        let descriptor: InsertErrorDescriptor = serde_json::from_value(raw.clone()).unwrap();
        match &descriptor {
            InsertErrorDescriptor::Row { index, errors } => {
                assert_eq!(*index, 1);
                assert_eq!(errors[0].reason.as_deref(), Some("invalid"));
            }
            other => panic!("unexpected descriptor: {other:?}"),
        }
        assert_eq!(serde_json::to_value(&descriptor).unwrap(), raw);
    }

    #[test]
    fn test_publish_failures_count() {
        let result = IngestResult {
            status: IngestStatus::Success,
            processed_count: 3,
            publish_outcomes: vec![
                PublishOutcome::success("m1"),
                PublishOutcome::error("x"),
                PublishOutcome::error("y"),
            ],
            insert_errors: None,
        };
        assert_eq!(result.publish_failures(), 2);
        assert!(result.is_success());
    }
}
