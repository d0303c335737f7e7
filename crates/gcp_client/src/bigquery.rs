//! BigQueryInserter - `tabledata.insertAll` streaming insert

use contracts::{BulkInserter, GatewayConfig, InsertErrorDescriptor, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use crate::error::Result;
use crate::http::ApiClient;

/// Project + dataset a client operates in
#[derive(Debug, Clone)]
pub struct DatasetRef {
    endpoint: String,
    pub project_id: String,
    pub dataset_id: String,
}

impl DatasetRef {
    pub fn new(
        endpoint: &str,
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            &config.bigquery.endpoint,
            config.gcp.project_id.clone(),
            config.gcp.dataset_id.clone(),
        )
    }

    /// `project.dataset`
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.project_id, self.dataset_id)
    }

    /// `project.dataset.table`
    pub fn qualified_table(&self, table_id: &str) -> String {
        format!("{}.{}", self.qualified(), table_id)
    }

    pub(crate) fn project_url(&self) -> String {
        format!("{}/bigquery/v2/projects/{}", self.endpoint, self.project_id)
    }

    pub(crate) fn datasets_url(&self) -> String {
        format!("{}/datasets", self.project_url())
    }

    pub(crate) fn tables_url(&self) -> String {
        format!("{}/{}/tables", self.datasets_url(), self.dataset_id)
    }

    pub(crate) fn table_url(&self, table_id: &str) -> String {
        format!("{}/{}", self.tables_url(), table_id)
    }
}

#[derive(Serialize)]
struct InsertAllRequest<'a> {
    rows: Vec<InsertAllRow<'a>>,
}

#[derive(Serialize)]
struct InsertAllRow<'a> {
    json: &'a Row,
}

#[derive(Deserialize)]
struct InsertAllResponse {
    #[serde(default, rename = "insertErrors")]
    insert_errors: Vec<InsertErrorDescriptor>,
}

/// Streaming inserter for one dataset
#[derive(Debug, Clone)]
pub struct BigQueryInserter {
    api: ApiClient,
    dataset: DatasetRef,
}

impl BigQueryInserter {
    pub fn new(api: ApiClient, dataset: DatasetRef) -> Self {
        Self { api, dataset }
    }

    pub fn from_config(config: &GatewayConfig, api: ApiClient) -> Self {
        Self::new(api, DatasetRef::from_config(config))
    }

    pub fn dataset(&self) -> &DatasetRef {
        &self.dataset
    }

    /// Insert and report per-row rejections; transport faults surface as `Err`
    pub async fn try_insert(
        &self,
        table_id: &str,
        rows: &[Row],
    ) -> Result<Vec<InsertErrorDescriptor>> {
        let url = format!("{}/insertAll", self.dataset.table_url(table_id));
        let request = InsertAllRequest {
            rows: rows.iter().map(|json| InsertAllRow { json }).collect(),
        };

        let response: InsertAllResponse = self
            .api
            .post_json(&url, &request, "bigquery insertAll")
            .await?;
        Ok(response.insert_errors)
    }
}

impl BulkInserter for BigQueryInserter {
    #[instrument(
        name = "bigquery_insert",
        skip(self, rows),
        fields(table = %self.dataset.qualified_table(table_id), rows = rows.len())
    )]
    async fn insert(&self, table_id: &str, rows: &[Row]) -> Vec<InsertErrorDescriptor> {
        match self.try_insert(table_id, rows).await {
            Ok(errors) if errors.is_empty() => {
                debug!("All rows accepted");
                errors
            }
            Ok(errors) => {
                warn!(rejected = errors.len(), errors = ?errors, "BigQuery insert errors");
                errors
            }
            Err(e) => {
                error!(error = %e, "Error inserting to BigQuery");
                vec![InsertErrorDescriptor::fault(e.to_string())]
            }
        }
    }
}
