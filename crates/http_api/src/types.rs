//! Request and response types for the gateway endpoints.

use contracts::{IngestResult, IngestStatus, InsertErrorDescriptor, PublishOutcome};
use serde::{Deserialize, Serialize};

/// Response payload for `POST /pipeline/process`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessResponse {
    pub status: IngestStatus,
    pub processed_count: usize,
    /// One entry per submitted record, in request order.
    pub pubsub_results: Vec<PublishOutcome>,
    /// `null` when every row was accepted.
    pub bigquery_errors: Option<Vec<InsertErrorDescriptor>>,
}

impl From<IngestResult> for ProcessResponse {
    fn from(result: IngestResult) -> Self {
        Self {
            status: result.status,
            processed_count: result.processed_count,
            pubsub_results: result.publish_outcomes,
            bigquery_errors: result.insert_errors,
        }
    }
}

/// Response payload for `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RootResponse {
    pub message: String,
}

impl RootResponse {
    pub fn for_project(project_id: &str) -> Self {
        Self {
            message: format!("GCP Project ID is {project_id}"),
        }
    }
}

/// Response payload for errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub detail: String,
}
