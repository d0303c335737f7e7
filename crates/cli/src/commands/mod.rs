//! Command implementations.

mod query;
mod serve;
mod setup_table;
mod validate;

pub use query::run_query;
pub use serve::run_serve;
pub use setup_table::run_setup_table;
pub use validate::run_validate;

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, GatewayConfig};
use contracts::ContractError;
use tracing::info;

use crate::cli::ConfigArgs;

/// Load file + environment + flag overrides, then validate
fn load_config(args: &ConfigArgs) -> Result<GatewayConfig> {
    let config = try_load_config(args).with_context(|| match &args.config {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load config from environment".to_string(),
    })?;

    info!(
        project = %config.gcp.project_id,
        table = %config.full_table_id(),
        topic = %config.pubsub.topic_id,
        "Configuration loaded"
    );
    Ok(config)
}

fn try_load_config(args: &ConfigArgs) -> std::result::Result<GatewayConfig, ContractError> {
    try_load_config_with(args, process_env)
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Flag overrides first, then `env`
fn try_load_config_with<F>(args: &ConfigArgs, env: F) -> std::result::Result<GatewayConfig, ContractError>
where
    F: Fn(&str) -> Option<String>,
{
    let overrides = args.overrides();
    ConfigLoader::load_with_env(args.config.as_deref(), |key| {
        overrides
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.clone())
            .or_else(|| env(key))
    })
}
