//! # Pipeline Gateway CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - HTTP 网关服务与优雅关闭
//! - BigQuery 数据集/表初始化
//! - 查询报表
//! - 配置校验

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_query, run_serve, run_setup_table, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging (and the metrics exporter for `serve`)
    let mut observability =
        ObservabilityConfig::from_verbosity(cli.verbose, cli.quiet, cli.log_format.into());
    if let Commands::Serve(args) = &cli.command {
        observability = observability.with_metrics_port(args.metrics_port);
    }
    observability::init_with_config(observability)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Pipeline Gateway CLI starting"
    );

    // Execute command
    let result = match &cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::SetupTable(args) => run_setup_table(args).await,
        Commands::Query(args) => run_query(args).await,
        Commands::Validate(args) => run_validate(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
