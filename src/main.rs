//! AnyAPI Hub - operator CLI
//!
//! Thin shell over the library: every subcommand builds an [`AppContext`]
//! and prints JSON (or YAML) to stdout.

use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::error;

use anyapi_hub::{
    capability::ActionRequest,
    cli::{Cli, Command, OutputFormat},
    config::Config,
    context::AppContext,
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let ctx = AppContext::build(&config)
        .await
        .context("Failed to initialize")?;

    let out = cli.output;
    let code = match cli.command {
        Command::Apis {
            search,
            requires_auth,
        } => {
            let defs = match search.as_deref() {
                Some(term) => ctx.registry.search(term),
                None => ctx.registry.list(),
            };
            let apis: Vec<Value> = defs
                .iter()
                .filter(|d| !requires_auth || d.requires_auth)
                .map(|d| {
                    json!({
                        "id": d.id,
                        "name": d.name,
                        "requiresAuth": d.requires_auth,
                        "endpoints": d.endpoint_names(),
                    })
                })
                .collect();
            print_output(out, &apis)?;
            ExitCode::SUCCESS
        }

        Command::Docs { api_id } => {
            let envelope = ctx
                .hub
                .execute_action("anyapi", "get_api_documentation", json!({ "apiId": api_id }))
                .await?;
            print_envelope(out, envelope.success, &envelope)?
        }

        Command::Call {
            action,
            params,
            agent_id,
        } => {
            let params: Map<String, Value> =
                serde_json::from_str(&params).context("--params must be a JSON object")?;
            let request = ActionRequest {
                agent_id,
                ..ActionRequest::new(action, params)
            };
            let result = ctx.capabilities.execute(request).await;
            print_envelope(out, result.success, &result)?
        }

        Command::Tools => {
            print_output(out, &ctx.hub.get_all_tools())?;
            ExitCode::SUCCESS
        }

        Command::Invoke { server, tool, args } => {
            let args: Value = serde_json::from_str(&args).context("--args must be valid JSON")?;
            let envelope = ctx.hub.execute_action(&server, &tool, args).await?;
            print_envelope(out, envelope.success, &envelope)?
        }

        Command::Status => {
            let status = ctx.hub.get_hub_status().await;
            print_output(out, &json!({
                "hub": status,
                "registry": ctx.registry.summary(),
            }))?;
            ExitCode::SUCCESS
        }
    };

    ctx.hub.shutdown_all().await;
    Ok(code)
}

fn print_output<T: Serialize>(format: OutputFormat, value: &T) -> anyhow::Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn print_envelope<T: Serialize>(
    format: OutputFormat,
    success: bool,
    value: &T,
) -> anyhow::Result<ExitCode> {
    print_output(format, value)?;
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
