//! `setup-table` command implementation.

use anyhow::{Context, Result};
use contracts::{Record, Row};
use gcp_client::{record_table_schema, GcpClients, Provisioned};
use tracing::info;

use crate::cli::SetupTableArgs;

/// Execute the `setup-table` command
pub async fn run_setup_table(args: &SetupTableArgs) -> Result<()> {
    let config = super::load_config(&args.config)?;
    let clients = GcpClients::from_config(&config).context("Failed to create GCP clients")?;
    let table_id = &config.bigquery.table_id;
    let full_table_id = config.full_table_id();

    println!("Using dataset: {}", config.dataset_path());
    println!("Using table: {full_table_id}");

    match clients.admin.ensure_dataset().await {
        Ok(Provisioned::Created) => println!("Dataset {} created.", config.dataset_path()),
        Ok(Provisioned::AlreadyExists) => println!("Dataset {} ready.", config.dataset_path()),
        Err(e) => {
            println!("Error creating dataset: {e}");
            println!("Failed to create table, skipping data insertion.");
            return Err(e).context("Dataset provisioning failed");
        }
    }

    match clients
        .admin
        .ensure_table(table_id, &record_table_schema())
        .await
    {
        Ok((Provisioned::Created, _)) => println!("Table {full_table_id} created with schema."),
        Ok((Provisioned::AlreadyExists, _)) => {
            println!("Table {full_table_id} already exists with schema.")
        }
        Err(e) => {
            println!("Error creating table: {e}");
            println!("Failed to create table, skipping data insertion.");
            return Err(e).context("Table provisioning failed");
        }
    }

    if args.sample_rows == 0 {
        info!("No sample rows requested");
        return Ok(());
    }

    let rows = sample_rows(args.sample_rows)?;
    println!("Attempting to insert {} rows...", rows.len());
    let errors = clients
        .inserter
        .try_insert(table_id, &rows)
        .await
        .context("Sample row insert failed")?;

    if errors.is_empty() {
        println!("Inserted {} rows successfully.", rows.len());
        Ok(())
    } else {
        println!("Errors: {}", serde_json::to_string(&errors)?);
        anyhow::bail!("{} sample rows were rejected", errors.len())
    }
}

/// `User0 / 0.0`, `User1 / 1.0`, ...
fn sample_rows(count: usize) -> Result<Vec<Row>> {
    (0..count)
        .map(|i| {
            Record::new(format!("User{i}"), i as f64)
                .to_row()
                .context("Failed to render sample row")
        })
        .collect()
}
