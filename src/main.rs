//! Coinglass MCP - Main Entry Point
//!
//! stdout carries the protocol, so every log line goes to stderr and the
//! rolling log file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coinglass_mcp::coinglass::{CoinglassClient, CoinglassService};
use coinglass_mcp::config::Settings;
use coinglass_mcp::logging::init_logging;
use coinglass_mcp::server::McpServer;
use coinglass_mcp::tools::ToolRegistry;
use serde_json::Value;
use tracing::info;

/// Coinglass MCP CLI
#[derive(Parser)]
#[command(name = "coinglass-mcp")]
#[command(version, about = "Coinglass derivatives market data as MCP tools")]
struct Cli {
    /// Directory for the rolling log file
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server on stdin/stdout (default)
    Serve,

    /// Print the available tools and their input schemas
    Tools,

    /// Invoke one tool and print its text result
    Call {
        /// Tool name, e.g. COINGLASS_FUNDING_RATE
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_dir)?;

    let settings = Settings::load().context("Failed to load configuration")?;
    let client_config = settings
        .client_config()
        .context("Invalid Coinglass configuration")?;
    info!(
        "Coinglass v{} | base URL {} | min interval {:?} | timeout {:?}",
        env!("CARGO_PKG_VERSION"),
        client_config.base_url(),
        client_config.min_request_interval(),
        client_config.request_timeout()
    );

    let client = Arc::new(CoinglassClient::new(client_config)?);
    let registry = Arc::new(ToolRegistry::new(CoinglassService::new(client)));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => McpServer::new(registry).serve_stdio().await,
        Commands::Tools => {
            for tool in registry.tools() {
                println!("{}\n  {}", tool.name(), tool.description());
                println!("  {}", tool.input_schema());
            }
            Ok(())
        }
        Commands::Call { tool, args } => {
            let arguments: Value =
                serde_json::from_str(&args).context("--args must be a JSON object")?;
            let output = registry
                .call(&tool, arguments)
                .await
                .with_context(|| format!("Unknown tool: {tool}"))?;

            println!("{}", output.text);
            if output.is_error {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
