//! BigQueryAdmin - dataset/table provisioning and standard-SQL queries

use std::time::Duration;

use contracts::{GatewayConfig, Row};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use crate::bigquery::DatasetRef;
use crate::error::{GcpError, Result};
use crate::http::ApiClient;

/// Server-side wait per `jobs.query` / `getQueryResults` call
const QUERY_WAIT_MS: u64 = 10_000;

/// Give up after this many incomplete polls
const MAX_QUERY_POLLS: usize = 60;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl FieldSchema {
    pub fn required(name: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            mode: Some("REQUIRED".to_string()),
        }
    }
}

/// Schema of the record table: `name STRING REQUIRED, value FLOAT REQUIRED`
pub fn record_table_schema() -> Vec<FieldSchema> {
    vec![
        FieldSchema::required("name", "STRING"),
        FieldSchema::required("value", "FLOAT"),
    ]
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TableSchema {
    #[serde(default)]
    fields: Vec<FieldSchema>,
}

/// Table metadata returned by `tables.get`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    schema: TableSchema,
    /// int64 is serialized as a string by the REST API
    #[serde(default)]
    pub num_rows: Option<String>,
    #[serde(default)]
    pub creation_time: Option<String>,
}

impl TableInfo {
    pub fn fields(&self) -> &[FieldSchema] {
        &self.schema.fields
    }
}

/// Whether a provisioning call created the resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    AlreadyExists,
}

/// Decoded query result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<FieldSchema>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    job_reference: Option<JobReference>,
    #[serde(default)]
    schema: TableSchema,
    #[serde(default)]
    rows: Vec<RawRow>,
    #[serde(default)]
    page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    job_id: String,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    f: Vec<RawCell>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    v: Value,
}

/// Provisioning and query client for one dataset
#[derive(Debug, Clone)]
pub struct BigQueryAdmin {
    api: ApiClient,
    dataset: DatasetRef,
    location: Option<String>,
}

impl BigQueryAdmin {
    pub fn new(api: ApiClient, dataset: DatasetRef, location: Option<String>) -> Self {
        Self {
            api,
            dataset,
            location,
        }
    }

    pub fn from_config(config: &GatewayConfig, api: ApiClient) -> Self {
        Self::new(
            api,
            DatasetRef::from_config(config),
            config.bigquery.location.clone(),
        )
    }

    pub fn dataset(&self) -> &DatasetRef {
        &self.dataset
    }

    /// Create the dataset; an existing one is not an error
    #[instrument(name = "bigquery_ensure_dataset", skip(self), fields(dataset = %self.dataset.qualified()))]
    pub async fn ensure_dataset(&self) -> Result<Provisioned> {
        let mut body = json!({
            "datasetReference": {
                "projectId": self.dataset.project_id,
                "datasetId": self.dataset.dataset_id,
            }
        });
        if let Some(location) = &self.location {
            body["location"] = json!(location);
        }

        match self
            .api
            .post_json::<_, Value>(&self.dataset.datasets_url(), &body, "bigquery datasets.insert")
            .await
        {
            Ok(_) => {
                info!("Dataset created");
                Ok(Provisioned::Created)
            }
            Err(e) if e.is_conflict() => {
                debug!("Dataset already exists");
                Ok(Provisioned::AlreadyExists)
            }
            Err(e) => Err(e),
        }
    }

    /// Table metadata, `None` if the table does not exist
    pub async fn get_table(&self, table_id: &str) -> Result<Option<TableInfo>> {
        match self
            .api
            .get_json::<TableInfo>(&self.dataset.table_url(table_id), "bigquery tables.get")
            .await
        {
            Ok(info) => Ok(Some(info)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create_table(&self, table_id: &str, schema: &[FieldSchema]) -> Result<TableInfo> {
        let body = json!({
            "tableReference": {
                "projectId": self.dataset.project_id,
                "datasetId": self.dataset.dataset_id,
                "tableId": table_id,
            },
            "schema": { "fields": schema },
        });
        self.api
            .post_json(&self.dataset.tables_url(), &body, "bigquery tables.insert")
            .await
    }

    /// Create the table with `schema` unless it already exists
    #[instrument(
        name = "bigquery_ensure_table",
        skip(self, schema),
        fields(table = %self.dataset.qualified_table(table_id))
    )]
    pub async fn ensure_table(
        &self,
        table_id: &str,
        schema: &[FieldSchema],
    ) -> Result<(Provisioned, TableInfo)> {
        if let Some(existing) = self.get_table(table_id).await? {
            debug!("Table already exists");
            return Ok((Provisioned::AlreadyExists, existing));
        }
        let created = self.create_table(table_id, schema).await?;
        info!("Table created");
        Ok((Provisioned::Created, created))
    }

    /// Run a standard-SQL query and wait for its rows
    #[instrument(name = "bigquery_query", skip(self, sql))]
    pub async fn query(&self, sql: &str) -> Result<QueryResult> {
        let mut body = json!({
            "query": sql,
            "useLegacySql": false,
            "timeoutMs": QUERY_WAIT_MS,
        });
        if let Some(location) = &self.location {
            body["location"] = json!(location);
        }

        let queries_url = format!("{}/queries", self.dataset.project_url());
        let mut response: QueryResponse = self
            .api
            .post_json(&queries_url, &body, "bigquery jobs.query")
            .await?;

        let mut job = response.job_reference.take();
        let mut polls = 0;
        while !response.job_complete {
            polls += 1;
            if polls > MAX_QUERY_POLLS {
                return Err(GcpError::unexpected(
                    "bigquery jobs.query",
                    format!("query did not complete after {MAX_QUERY_POLLS} polls"),
                ));
            }

            let current = job.as_ref().ok_or_else(|| {
                GcpError::unexpected("bigquery jobs.query", "incomplete job without jobReference")
            })?;
            let url = self.results_url(&queries_url, current, None)?;
            debug!(job_id = %current.job_id, polls, "Waiting for query job");

            tokio::time::sleep(POLL_INTERVAL).await;
            response = self
                .api
                .get_json(&url, "bigquery jobs.getQueryResults")
                .await?;
            if let Some(reference) = response.job_reference.take() {
                job = Some(reference);
            }
        }

        let columns = response.schema.fields;
        let mut rows = decode_rows(&columns, response.rows);
        let mut page_token = response.page_token;

        while let Some(token) = page_token {
            let current = job.as_ref().ok_or_else(|| {
                GcpError::unexpected("bigquery jobs.getQueryResults", "paged result without jobReference")
            })?;
            let url = self.results_url(&queries_url, current, Some(&token))?;
            debug!(job_id = %current.job_id, rows = rows.len(), "Fetching next result page");

            let page: QueryResponse = self
                .api
                .get_json(&url, "bigquery jobs.getQueryResults")
                .await?;
            rows.extend(decode_rows(&columns, page.rows));
            page_token = page.page_token;
        }

        Ok(QueryResult { columns, rows })
    }

    /// `getQueryResults` URL for `job`, optionally at a result page
    fn results_url(
        &self,
        queries_url: &str,
        job: &JobReference,
        page_token: Option<&str>,
    ) -> Result<String> {
        let mut url = reqwest::Url::parse(&format!("{queries_url}/{}", job.job_id))
            .map_err(|e| GcpError::unexpected("bigquery jobs.getQueryResults", e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("timeoutMs", &QUERY_WAIT_MS.to_string());
            if let Some(location) = job.location.as_ref().or(self.location.as_ref()) {
                query.append_pair("location", location);
            }
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        Ok(url.into())
    }
}

fn decode_rows(columns: &[FieldSchema], rows: Vec<RawRow>) -> Vec<Row> {
    rows.into_iter()
        .map(|row| {
            columns
                .iter()
                .zip(row.f)
                .map(|(column, cell)| (column.name.clone(), decode_cell(&column.field_type, cell.v)))
                .collect()
        })
        .collect()
}

/// Cells arrive as strings; convert scalar types back to JSON numbers/bools
fn decode_cell(field_type: &str, value: Value) -> Value {
    let Value::String(raw) = value else {
        return value;
    };
    match field_type {
        "INTEGER" | "INT64" => raw.parse::<i64>().map(Value::from).unwrap_or(Value::String(raw)),
        "FLOAT" | "FLOAT64" | "NUMERIC" | "BIGNUMERIC" => raw
            .parse::<f64>()
            .ok()
            .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
            .unwrap_or(Value::String(raw)),
        "BOOLEAN" | "BOOL" => match raw.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw),
        },
        _ => Value::String(raw),
    }
}
