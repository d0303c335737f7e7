//! `validate` command implementation.

use anyhow::{Context, Result};
use config_loader::GatewayConfig;
use contracts::StatusPolicy;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    project_id: String,
    table: String,
    topic: String,
    bind_addr: String,
    publish_concurrency: usize,
    status_policy: StatusPolicy,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = ?args.config.config, "Validating configuration");

    let result = validate_config(args, super::process_env);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config<F>(args: &ValidateArgs, env: F) -> ValidationResult
where
    F: Fn(&str) -> Option<String>,
{
    let config_path = args.config.config.as_ref().map(|p| p.display().to_string());

    match super::try_load_config_with(&args.config, env) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    project_id: config.gcp.project_id.clone(),
                    table: config.full_table_id(),
                    topic: config.pubsub.topic_id.clone(),
                    bind_addr: config.server.bind_addr.to_string(),
                    publish_concurrency: config.pipeline.publish_concurrency,
                    status_policy: config.pipeline.status_policy,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &GatewayConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.gcp.credentials_path.is_none() {
        if config.uses_default_endpoints() {
            warnings.push(
                "No credentials file configured - tokens come from the metadata server".to_string(),
            );
        } else {
            warnings.push(
                "No credentials file configured - emulator endpoints are called anonymously"
                    .to_string(),
            );
        }
    }

    if config.pipeline.status_policy == StatusPolicy::InsertOnly {
        warnings.push(
            "status_policy = insert_only - failed publishes still report success".to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    let source = result.config_path.as_deref().unwrap_or("(environment)");
    if result.valid {
        println!("✓ Configuration is valid: {}", source);

        if let Some(ref summary) = result.summary {
            println!("\n  Project: {}", summary.project_id);
            println!("  Table: {}", summary.table);
            println!("  Topic: {}", summary.topic);
            println!("  Bind: {}", summary.bind_addr);
            println!("  Publish concurrency: {}", summary.publish_concurrency);
            println!("  Status policy: {:?}", summary.status_policy);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", source);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
