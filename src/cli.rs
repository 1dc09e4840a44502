//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// AnyAPI Hub - schema-validated REST API invocation behind a tool hub
#[derive(Parser, Debug)]
#[command(name = "anyapi-hub")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "ANYAPI_HUB_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "warn",
        env = "ANYAPI_HUB_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "ANYAPI_HUB_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Output format for command results
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    pub output: OutputFormat,

    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// How command results are rendered on stdout
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// YAML
    Yaml,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List registered APIs
    Apis {
        /// Case-insensitive search over id, name and description
        #[arg(short, long)]
        search: Option<String>,

        /// Only APIs that require authentication
        #[arg(long)]
        requires_auth: bool,
    },

    /// Show documentation for an API
    Docs {
        /// API id
        #[arg(required = true)]
        api_id: String,
    },

    /// Execute an `apiId.endpoint` action through the capability wrapper
    Call {
        /// Action, e.g. `coingecko.simple_price`
        #[arg(required = true)]
        action: String,

        /// JSON parameter object
        #[arg(short, long, default_value = "{}")]
        params: String,

        /// Agent id used for credential lookup
        #[arg(long)]
        agent_id: Option<String>,
    },

    /// List every tool of every provider
    Tools,

    /// Invoke a tool through the hub
    Invoke {
        /// Provider name
        #[arg(required = true)]
        server: String,

        /// Tool name
        #[arg(required = true)]
        tool: String,

        /// JSON arguments
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Show hub status and registry summary
    Status,
}
