//! makemcp CLI entry point
//!
//! Usage:
//!   makemcp serve             Start MCP server over stdio
//!   makemcp run <target>      Run a make target and print the result JSON
//!   makemcp describe          Print the tool description
//!   makemcp config            Show configuration

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use makemcp::cli::{
    commands::{ConfigArgs, ConfigFormat, OverrideArgs, RunArgs},
    run_mcp_server, Cli, Commands,
};
use makemcp::config::{load_config, load_config_with_sources, Config};
use makemcp::executor::{serialize_result, CallContext, Executor, MakeParams};
use makemcp::mcp::MakeServer;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; stdout carries the MCP transport and result JSON
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "makemcp=debug" } else { "makemcp=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Serve => {
            run_mcp_server(cli.config.as_deref()).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run(args) => run_target(args, cli.config.as_deref()).await,
        Commands::Describe(args) => {
            describe(args, cli.config.as_deref()).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config(args) => {
            show_config(args, cli.config.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_with_overrides(config_path: Option<&str>, overrides: &OverrideArgs) -> Result<Config> {
    let mut config = load_config(config_path)?;
    overrides.apply(&mut config);
    Ok(config)
}

/// Run one target; exit status mirrors the make result
async fn run_target(args: RunArgs, config_path: Option<&str>) -> Result<ExitCode> {
    let config = load_with_overrides(config_path, &args.overrides)?;
    let executor = Executor::new(config.executor_config()?)
        .context("Failed to configure make executor")?;

    let ctx = CallContext::new();
    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let execution = executor.execute(&ctx, &MakeParams::new(&args.target)).await;
    println!("{}", serialize_result(&execution.result)?);

    if execution.is_success() {
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(e) = &execution.error {
        eprintln!("{}: {}", "error".red().bold(), e);
    }
    Ok(ExitCode::FAILURE)
}

/// Print the description the MCP server would publish
async fn describe(args: OverrideArgs, config_path: Option<&str>) -> Result<()> {
    let config = load_with_overrides(config_path, &args)?;
    let server = MakeServer::new(&config).context("Failed to configure make executor")?;

    print!("{}", server.describe().await);
    Ok(())
}

/// Show resolved configuration, or the files it came from
fn show_config(args: ConfigArgs, config_path: Option<&str>) -> Result<()> {
    let loaded = load_config_with_sources(config_path)?;

    if args.sources {
        if loaded.sources.is_empty() {
            eprintln!("No config files found; using defaults");
        }
        for path in &loaded.sources {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let config = loaded.config;
    match args.format {
        ConfigFormat::Toml => print!("{}", toml::to_string_pretty(&config)?),
        ConfigFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
    }

    Ok(())
}
