//! # GCP Client
//!
//! REST clients for the managed services behind the gateway.
//!
//! Responsibilities:
//! - Mint and cache access tokens (service account key, metadata server, anonymous)
//! - Publish single messages to a Pub/Sub topic
//! - Stream rows into a BigQuery table via `insertAll`
//! - Provision the dataset/table and run standard-SQL queries
//! - Provide mock publisher/inserter with failure injection

pub mod admin;
pub mod auth;
pub mod bigquery;
pub mod error;
pub mod http;
pub mod mock;
pub mod pubsub;

use std::sync::Arc;

use contracts::GatewayConfig;

pub use admin::{record_table_schema, BigQueryAdmin, FieldSchema, Provisioned, QueryResult, TableInfo};
pub use auth::{ServiceAccountKey, TokenProvider, TokenSource};
pub use bigquery::{BigQueryInserter, DatasetRef};
pub use error::{GcpError, Result};
pub use http::{build_http_client, ApiClient};
pub use mock::{MockInserter, MockPublisher, MockPublisherConfig};
pub use pubsub::PubSubPublisher;

/// All clients built from one configuration, sharing a token cache
#[derive(Debug, Clone)]
pub struct GcpClients {
    pub publisher: PubSubPublisher,
    pub inserter: BigQueryInserter,
    pub admin: BigQueryAdmin,
}

impl GcpClients {
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let http = build_http_client(&config.http)?;
        let tokens = Arc::new(TokenProvider::from_config(config, http.clone())?);
        let api = ApiClient::new(http, tokens);

        Ok(Self {
            publisher: PubSubPublisher::from_config(config, api.clone()),
            inserter: BigQueryInserter::from_config(config, api.clone()),
            admin: BigQueryAdmin::from_config(config, api),
        })
    }
}
