//! `query` command implementation.

use anyhow::{Context, Result};
use config_loader::GatewayConfig;
use gcp_client::{BigQueryAdmin, GcpClients, QueryResult};
use serde_json::Value;
use tracing::warn;

use crate::cli::{QueryArgs, QueryCommand};

const RECENT_LIMIT: u32 = 5;
const REPORT_TOP_LIMIT: u32 = 10;

/// Execute the `query` command
pub async fn run_query(args: &QueryArgs) -> Result<()> {
    let config = super::load_config(&args.config)?;
    let command = args.query.clone().unwrap_or(QueryCommand::Report);

    let clients = GcpClients::from_config(&config).context("Failed to create GCP clients")?;
    let runner = QueryRunner {
        admin: &clients.admin,
        table: config.full_table_id(),
    };

    match command {
        QueryCommand::Info => {
            print_table_info(&config);
            Ok(())
        }
        QueryCommand::Count => runner.count().await,
        QueryCommand::Stats => runner.stats().await,
        QueryCommand::Top { limit } => runner.top(limit).await,
        QueryCommand::Recent => runner.recent().await,
        QueryCommand::Sql { query } => runner.custom(&query).await,
        QueryCommand::Report => {
            print_table_info(&config);
            runner.report().await;
            Ok(())
        }
    }
}

fn print_table_info(config: &GatewayConfig) {
    println!("=== Table Information ===");
    println!("Project: {}", config.gcp.project_id);
    println!("Dataset: {}", config.gcp.dataset_id);
    println!("Table: {}", config.bigquery.table_id);
    println!("Full Table ID: {}", config.full_table_id());
    println!();
}

struct QueryRunner<'a> {
    admin: &'a BigQueryAdmin,
    table: String,
}

impl QueryRunner<'_> {
    async fn count(&self) -> Result<()> {
        println!("=== Row Count ===");
        let result = self.run(&count_sql(&self.table)).await?;
        for row in &result.rows {
            println!("Total rows: {}", display_value(row.get("total_rows")));
        }
        println!();
        Ok(())
    }

    async fn stats(&self) -> Result<()> {
        println!("=== Statistics ===");
        let result = self.run(&stats_sql(&self.table)).await?;
        for row in &result.rows {
            println!("Total rows: {}", display_value(row.get("total_rows")));
            println!("Min value: {}", display_value(row.get("min_value")));
            println!("Max value: {}", display_value(row.get("max_value")));
            match row.get("avg_value").and_then(Value::as_f64) {
                Some(avg) => println!("Average value: {avg:.2}"),
                None => println!("Average value: -"),
            }
        }
        println!();
        Ok(())
    }

    async fn top(&self, limit: u32) -> Result<()> {
        println!("=== All Data (Top {limit}) ===");
        let result = self.run(&top_sql(&self.table, limit)).await?;
        print_name_values(&result);
        Ok(())
    }

    async fn recent(&self) -> Result<()> {
        println!("=== Recent Data (Last {RECENT_LIMIT} entries) ===");
        let result = self.run(&recent_sql(&self.table)).await?;
        print_name_values(&result);
        Ok(())
    }

    async fn custom(&self, sql: &str) -> Result<()> {
        println!("=== Custom Query ===");
        println!("SQL: {sql}");
        println!("Results:");
        let result = self.run(sql).await?;
        for row in &result.rows {
            println!("{}", Value::Object(row.clone()));
        }
        println!();
        Ok(())
    }

    /// Every section runs even when an earlier one fails
    async fn report(&self) {
        report_step("count", self.count().await);
        report_step("stats", self.stats().await);
        report_step("recent", self.recent().await);
        report_step("top", self.top(REPORT_TOP_LIMIT).await);

        println!("=== Example Custom Queries ===");
        for sql in example_queries(&self.table) {
            report_step("custom", self.custom(&sql).await);
        }
    }

    async fn run(&self, sql: &str) -> Result<QueryResult> {
        self.admin
            .query(sql)
            .await
            .with_context(|| format!("Error running query: {sql}"))
    }
}

fn report_step(name: &str, result: Result<()>) {
    if let Err(e) = result {
        warn!(step = name, error = %e, "Report step failed");
        println!("{e:#}");
        println!();
    }
}

fn print_name_values(result: &QueryResult) {
    for row in &result.rows {
        println!(
            "Name: {}, Value: {}",
            display_value(row.get("name")),
            display_value(row.get("value"))
        );
    }
    println!();
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}

fn count_sql(table: &str) -> String {
    format!("SELECT COUNT(*) AS total_rows FROM `{table}`")
}

fn stats_sql(table: &str) -> String {
    format!(
        "SELECT COUNT(*) AS total_rows, MIN(value) AS min_value, MAX(value) AS max_value, \
         AVG(value) AS avg_value FROM `{table}`"
    )
}

fn top_sql(table: &str, limit: u32) -> String {
    format!("SELECT * FROM `{table}` ORDER BY value DESC LIMIT {limit}")
}

fn recent_sql(table: &str) -> String {
    format!("SELECT * FROM `{table}` ORDER BY name DESC LIMIT {RECENT_LIMIT}")
}

fn example_queries(table: &str) -> [String; 3] {
    [
        format!("SELECT * FROM `{table}` WHERE value > 5"),
        format!("SELECT name, COUNT(*) AS count FROM `{table}` GROUP BY name"),
        format!("SELECT * FROM `{table}` WHERE name LIKE '%pipeline%'"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TABLE: &str = "demo.analytics.my_table";

    #[test]
    fn test_sql_quotes_full_table_id() {
        assert_eq!(
            count_sql(TABLE),
            "SELECT COUNT(*) AS total_rows FROM `demo.analytics.my_table`"
        );
        assert_eq!(
            top_sql(TABLE, 3),
            "SELECT * FROM `demo.analytics.my_table` ORDER BY value DESC LIMIT 3"
        );
        assert!(recent_sql(TABLE).ends_with("ORDER BY name DESC LIMIT 5"));
        assert!(stats_sql(TABLE).contains("AVG(value) AS avg_value"));
    }

    #[test]
    fn test_example_queries_order() {
        let queries = example_queries(TABLE);
        assert!(queries[0].ends_with("WHERE value > 5"));
        assert!(queries[1].contains("GROUP BY name"));
        assert!(queries[2].contains("LIKE '%pipeline%'"));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(Some(&json!("User1"))), "User1");
        assert_eq!(display_value(Some(&json!(2.5))), "2.5");
        assert_eq!(display_value(Some(&Value::Null)), "-");
        assert_eq!(display_value(None), "-");
    }
}
