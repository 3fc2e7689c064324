//! Process configuration: command-line flags with environment fallbacks.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::api::client::{DEFAULT_TASKS_SEGMENT, DEFAULT_TIMEOUT};
use crate::api::{BitbucketError, ClientConfig, Credentials};

/// MCP server for Bitbucket Cloud: pull requests, comments, tasks and branches
#[derive(Debug, Parser)]
#[command(name = "mcp-bitbucket", version, about)]
pub struct Cli {
    /// Bitbucket workspace ID used when a tool call does not name one
    #[arg(long, env = "BITBUCKET_WORKSPACE")]
    pub workspace: Option<String>,

    /// Bitbucket account username
    #[arg(long, env = "BITBUCKET_USERNAME")]
    pub username: Option<String>,

    /// Bitbucket app password
    #[arg(long, env = "BITBUCKET_APP_PASSWORD", hide_env_values = true)]
    pub app_password: Option<String>,

    /// Repository slug used when a tool call does not name one
    #[arg(long, env = "BITBUCKET_DEFAULT_REPO")]
    pub default_repo: Option<String>,

    /// Log level, overridden by RUST_LOG when set
    #[arg(
        long,
        env = "LOG_LEVEL",
        value_enum,
        ignore_case = true,
        default_value_t = LogLevel::Info
    )]
    pub log_level: LogLevel,

    /// Bitbucket API base URL (default: https://api.bitbucket.org/2.0)
    #[arg(long, env = "BITBUCKET_BASE_URL")]
    pub base_url: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, env = "BITBUCKET_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT.as_millis() as u64)]
    pub timeout_ms: u64,

    /// Path segment serving pull request tasks
    #[arg(long, env = "BITBUCKET_TASKS_SEGMENT", default_value = DEFAULT_TASKS_SEGMENT)]
    pub tasks_segment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Validated configuration, built once at startup and shared with every tool.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub workspace: String,
    pub credentials: Credentials,
    pub default_repo: Option<String>,
    pub log_level: LogLevel,
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub tasks_segment: String,
}

impl ServerConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, BitbucketError> {
        let workspace = required(cli.workspace, "BITBUCKET_WORKSPACE")?;
        let username = required(cli.username, "BITBUCKET_USERNAME")?;
        let app_password = required(cli.app_password, "BITBUCKET_APP_PASSWORD")?;

        if workspace.trim().is_empty() {
            return Err(BitbucketError::Configuration(
                "Workspace cannot be empty".to_string(),
            ));
        }
        if username.trim().is_empty() {
            return Err(BitbucketError::Configuration(
                "Username cannot be empty".to_string(),
            ));
        }
        if app_password.trim().is_empty() {
            return Err(BitbucketError::Configuration(
                "App password cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            workspace,
            credentials: Credentials::new(username, app_password),
            default_repo: cli.default_repo.filter(|repo| !repo.trim().is_empty()),
            log_level: cli.log_level,
            base_url: cli.base_url.filter(|url| !url.trim().is_empty()),
            timeout: Duration::from_millis(cli.timeout_ms),
            tasks_segment: cli.tasks_segment,
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(self.credentials.clone())
            .timeout(self.timeout)
            .tasks_segment(self.tasks_segment.clone());
        match &self.base_url {
            Some(url) => config.base_url(url.clone()),
            None => config,
        }
    }
}

fn required(value: Option<String>, env_name: &str) -> Result<String, BitbucketError> {
    value.ok_or_else(|| {
        BitbucketError::Configuration(format!("{} environment variable is required", env_name))
    })
}
