//! Environment overlay
//!
//! Variables win over file values; empty values are treated as unset.

use contracts::{ContractError, GatewayConfig};
use tracing::debug;

pub const GCP_PROJECT_ID: &str = "GCP_PROJECT_ID";
pub const BIGQUERY_DATASET_ID: &str = "BIGQUERY_DATASET_ID";
pub const GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const BIGQUERY_TABLE_ID: &str = "BIGQUERY_TABLE_ID";
pub const BIGQUERY_LOCATION: &str = "BIGQUERY_LOCATION";
pub const PUBSUB_TOPIC_ID: &str = "PUBSUB_TOPIC_ID";
pub const PUBSUB_ENDPOINT: &str = "PUBSUB_ENDPOINT";
pub const BIGQUERY_ENDPOINT: &str = "BIGQUERY_ENDPOINT";
pub const GATEWAY_BIND_ADDR: &str = "GATEWAY_BIND_ADDR";

/// Apply environment variables on top of `config`
pub fn apply<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ContractError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get(GCP_PROJECT_ID) {
        config.gcp.project_id = v;
    }
    if let Some(v) = get(BIGQUERY_DATASET_ID) {
        config.gcp.dataset_id = v;
    }
    if let Some(v) = get(GOOGLE_APPLICATION_CREDENTIALS) {
        config.gcp.credentials_path = Some(v.into());
    }
    if let Some(v) = get(BIGQUERY_TABLE_ID) {
        config.bigquery.table_id = v;
    }
    if let Some(v) = get(BIGQUERY_LOCATION) {
        config.bigquery.location = Some(v);
    }
    if let Some(v) = get(PUBSUB_TOPIC_ID) {
        config.pubsub.topic_id = v;
    }
    if let Some(v) = get(PUBSUB_ENDPOINT) {
        config.pubsub.endpoint = v;
    }
    if let Some(v) = get(BIGQUERY_ENDPOINT) {
        config.bigquery.endpoint = v;
    }
    if let Some(v) = get(GATEWAY_BIND_ADDR) {
        config.server.bind_addr = v.parse().map_err(|e| {
            ContractError::config_validation(GATEWAY_BIND_ADDR, format!("invalid address '{v}': {e}"))
        })?;
    }

    debug!(
        project = %config.gcp.project_id,
        dataset = %config.gcp.dataset_id,
        table = %config.bigquery.table_id,
        topic = %config.pubsub.topic_id,
        "environment overlay applied"
    );
    Ok(())
}
