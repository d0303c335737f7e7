//! GatewayConfig - Config Loader output
//!
//! GCP project wiring, Pub/Sub topic, BigQuery table, HTTP listener and
//! coordinator tuning.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use validator::{Validate, ValidationError};

pub const DEFAULT_TOPIC_ID: &str = "data-topic";
pub const DEFAULT_TABLE_ID: &str = "my_table";
pub const DEFAULT_PUBSUB_ENDPOINT: &str = "https://pubsub.googleapis.com";
pub const DEFAULT_BIGQUERY_ENDPOINT: &str = "https://bigquery.googleapis.com";

/// Complete gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct GatewayConfig {
    /// Project / dataset / credentials
    #[serde(default)]
    #[validate(nested)]
    pub gcp: GcpConfig,

    /// Pub/Sub target
    #[serde(default)]
    #[validate(nested)]
    pub pubsub: PubSubConfig,

    /// BigQuery target
    #[serde(default)]
    #[validate(nested)]
    pub bigquery: BigQueryConfig,

    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,

    /// Coordinator behaviour
    #[serde(default)]
    #[validate(nested)]
    pub pipeline: PipelineConfig,

    /// Outbound HTTP client settings
    #[serde(default)]
    #[validate(nested)]
    pub http: HttpClientConfig,
}

impl GatewayConfig {
    /// `project.dataset`
    pub fn dataset_path(&self) -> String {
        format!("{}.{}", self.gcp.project_id, self.gcp.dataset_id)
    }

    /// `project.dataset.table`
    pub fn full_table_id(&self) -> String {
        format!("{}.{}", self.dataset_path(), self.bigquery.table_id)
    }

    /// Whether both endpoints point at the public Google APIs
    pub fn uses_default_endpoints(&self) -> bool {
        self.pubsub.endpoint == DEFAULT_PUBSUB_ENDPOINT
            && self.bigquery.endpoint == DEFAULT_BIGQUERY_ENDPOINT
    }
}

/// GCP project settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct GcpConfig {
    /// Project ID (GCP_PROJECT_ID)
    #[serde(default)]
    #[validate(length(min = 1, message = "project_id is required"))]
    pub project_id: String,

    /// Dataset ID (BIGQUERY_DATASET_ID)
    #[serde(default)]
    #[validate(length(min = 1, message = "dataset_id is required"))]
    pub dataset_id: String,

    /// Service account key file (GOOGLE_APPLICATION_CREDENTIALS)
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
}

/// Pub/Sub settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PubSubConfig {
    /// Topic ID (PUBSUB_TOPIC_ID)
    #[serde(default = "default_topic_id")]
    #[validate(length(min = 1, message = "topic_id cannot be empty"))]
    pub topic_id: String,

    /// API base URL, overridable for the emulator
    #[serde(default = "default_pubsub_endpoint")]
    #[validate(url, custom(function = "validate_http_endpoint"))]
    pub endpoint: String,
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            topic_id: default_topic_id(),
            endpoint: default_pubsub_endpoint(),
        }
    }
}

fn default_topic_id() -> String {
    DEFAULT_TOPIC_ID.to_string()
}

fn default_pubsub_endpoint() -> String {
    DEFAULT_PUBSUB_ENDPOINT.to_string()
}

/// Endpoints are REST bases; only http(s) is accepted
fn validate_http_endpoint(endpoint: &str) -> Result<(), ValidationError> {
    let scheme = endpoint.split_once("://").map(|(scheme, _)| scheme);
    match scheme {
        Some(s) if s.eq_ignore_ascii_case("http") || s.eq_ignore_ascii_case("https") => Ok(()),
        _ => Err(ValidationError::new("http_scheme")
            .with_message("endpoint must be an http or https URL".into())),
    }
}

/// BigQuery settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BigQueryConfig {
    /// Table ID inside the dataset (BIGQUERY_TABLE_ID)
    #[serde(default = "default_table_id")]
    #[validate(length(min = 1, message = "table_id cannot be empty"))]
    pub table_id: String,

    /// API base URL
    #[serde(default = "default_bigquery_endpoint")]
    #[validate(url, custom(function = "validate_http_endpoint"))]
    pub endpoint: String,

    /// Dataset location used when the dataset has to be created
    #[serde(default)]
    pub location: Option<String>,
}

impl Default for BigQueryConfig {
    fn default() -> Self {
        Self {
            table_id: default_table_id(),
            endpoint: default_bigquery_endpoint(),
            location: None,
        }
    }
}

fn default_table_id() -> String {
    DEFAULT_TABLE_ID.to_string()
}

fn default_bigquery_endpoint() -> String {
    DEFAULT_BIGQUERY_ENDPOINT.to_string()
}

/// HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

/// How the overall status is derived
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    /// Only insert errors downgrade the batch to partial success
    #[default]
    InsertOnly,
    /// Insert errors or any failed publish downgrade the batch
    AllSinks,
}

/// Coordinator tuning
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    /// Publishes in flight per batch (1 = strictly sequential)
    #[serde(default = "default_publish_concurrency")]
    #[validate(range(min = 1, max = 256))]
    pub publish_concurrency: usize,

    #[serde(default)]
    pub status_policy: StatusPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            publish_concurrency: default_publish_concurrency(),
            status_policy: StatusPolicy::default(),
        }
    }
}

fn default_publish_concurrency() -> usize {
    1
}

/// Outbound HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HttpClientConfig {
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.pubsub.topic_id, "data-topic");
        assert_eq!(config.bigquery.table_id, "my_table");
        assert_eq!(config.server.bind_addr.port(), 8000);
        assert_eq!(config.pipeline.publish_concurrency, 1);
        assert_eq!(config.pipeline.status_policy, StatusPolicy::InsertOnly);
        assert!(config.uses_default_endpoints());
    }

    #[test]
    fn test_full_table_id() {
        let mut config = GatewayConfig::default();
        config.gcp.project_id = "proj".to_string();
        config.gcp.dataset_id = "ds".to_string();
        config.bigquery.table_id = "events".to_string();
        assert_eq!(config.full_table_id(), "proj.ds.events");
    }

    #[test]
    fn test_empty_project_fails_validation() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_status_policy_deserialize() {
        let cfg: PipelineConfig =
            serde_json::from_str(r#"{"status_policy":"all_sinks"}"#).unwrap();
        assert_eq!(cfg.status_policy, StatusPolicy::AllSinks);
        assert_eq!(cfg.publish_concurrency, 1);
    }
}
