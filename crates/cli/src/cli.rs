//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

use config_loader::env;

/// Pipeline Gateway - fan record batches out to Pub/Sub and BigQuery
#[derive(Parser, Debug)]
#[command(
    name = "pipeline-gateway",
    author,
    version,
    about = "Pub/Sub + BigQuery ingest gateway",
    long_about = "An HTTP gateway that accepts batches of {name, value} records,\n\
                  publishes each record to a Pub/Sub topic and bulk-inserts the batch\n\
                  into a BigQuery table. Also provisions the table and runs reports."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "GATEWAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "GATEWAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP gateway
    Serve(ServeArgs),

    /// Create the dataset and table, optionally with sample rows
    SetupTable(SetupTableArgs),

    /// Run reports and ad-hoc SQL against the table
    Query(QueryArgs),

    /// Validate configuration without connecting to GCP
    Validate(ValidateArgs),
}

/// Configuration source and overrides shared by every command
///
/// Precedence: flags > environment (.env included) > file > defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to configuration file (TOML or JSON); optional
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override GCP project id
    #[arg(long)]
    pub project_id: Option<String>,

    /// Override BigQuery dataset id
    #[arg(long)]
    pub dataset_id: Option<String>,

    /// Override BigQuery table id
    #[arg(long)]
    pub table_id: Option<String>,

    /// Override Pub/Sub topic id
    #[arg(long)]
    pub topic_id: Option<String>,

    /// Override service account key file
    #[arg(long)]
    pub credentials: Option<PathBuf>,
}

impl ConfigArgs {
    /// Flag overrides keyed by the environment variable they shadow
    pub fn overrides(&self) -> Vec<(&'static str, String)> {
        let mut overrides = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(value) = value {
                overrides.push((key, value));
            }
        };
        push(env::GCP_PROJECT_ID, self.project_id.clone());
        push(env::BIGQUERY_DATASET_ID, self.dataset_id.clone());
        push(env::BIGQUERY_TABLE_ID, self.table_id.clone());
        push(env::PUBSUB_TOPIC_ID, self.topic_id.clone());
        push(
            env::GOOGLE_APPLICATION_CREDENTIALS,
            self.credentials.as_ref().map(|p| p.display().to_string()),
        );
        overrides
    }
}

/// Arguments for the `serve` command
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override listen address
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Override the number of publishes in flight per batch
    #[arg(long)]
    pub publish_concurrency: Option<usize>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9090", env = "GATEWAY_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without serving
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `setup-table` command
#[derive(Args, Debug, Clone)]
pub struct SetupTableArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Number of sample rows to insert after creating the table (0 = none)
    #[arg(long, default_value = "10")]
    pub sample_rows: usize,
}

/// Arguments for the `query` command
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub query: Option<QueryCommand>,
}

/// Query kinds; `report` when omitted
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum QueryCommand {
    /// Project, dataset, table and full table id
    Info,
    /// Row count
    Count,
    /// Count, min, max and average of `value`
    Stats,
    /// Rows with the largest values
    Top {
        #[arg(long, default_value = "10")]
        limit: u32,
    },
    /// Last 5 rows ordered by name
    Recent,
    /// Custom standard-SQL query
    Sql { query: String },
    /// All of the above plus example queries
    Report,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
