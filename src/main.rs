use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use mcp_bitbucket::api::BitbucketClient;
use mcp_bitbucket::config::{Cli, LogLevel, ServerConfig};
use mcp_bitbucket::server::BitbucketServer;
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            init_tracing(LogLevel::Info);
            tracing::error!("Invalid configuration: {}", e.to_string().trim_end());
            return ExitCode::FAILURE;
        }
    };
    init_tracing(cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Fatal error in Bitbucket MCP server: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

// stdout carries the MCP protocol; logs go to stderr.
fn init_tracing(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = ServerConfig::from_cli(cli).context("Invalid configuration")?;
    let client =
        BitbucketClient::new(config.client_config()).context("Failed to create Bitbucket client")?;

    tracing::info!(
        workspace = %config.workspace,
        default_repo = config.default_repo.as_deref().unwrap_or("none"),
        base_url = client.base_url(),
        "Starting mcp-bitbucket server"
    );

    let service = BitbucketServer::new(client, config);
    let running = service
        .serve(stdio())
        .await
        .context("Failed to start MCP service on stdio")?;

    tokio::select! {
        result = running.waiting() => {
            result.context("MCP service terminated abnormally")?;
        }
        signal = shutdown_signal() => {
            tracing::info!(signal, "Received shutdown signal, shutting down");
        }
    }

    Ok(())
}

async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => tokio::select! {
                _ = tokio::signal::ctrl_c() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                "SIGINT"
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        "SIGINT"
    }
}
