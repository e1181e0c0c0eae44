//! Quay - run docker-compose services on the `container` CLI
//!
//! This is the main CLI entry point for Quay.

use anyhow::Context;
use clap::{Parser, Subcommand};
use quay::compose::parser::DEFAULT_COMPOSE_FILE;
use quay::compose::{ComposeOrchestrator, ComposeParser};
use quay::runtime::{ProcessRuntime, DEFAULT_RUNTIME};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Quay - docker-compose for the `container` CLI
#[derive(Parser)]
#[command(name = "quay")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Run docker-compose services on a single-host container runtime", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Compose file (default: docker-compose.yml in the current directory)
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Container runtime binary
    #[arg(long, global = true, env = "QUAY_RUNTIME", default_value = DEFAULT_RUNTIME)]
    runtime: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start every service that is not already running
    Start,

    /// Show the status of every service
    Status,

    /// Stop every service
    Stop,

    /// Run one service in the foreground
    Run {
        /// Service name
        service: String,
        /// Arguments appended to the service command
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let compose_file = match cli.file {
        Some(file) => cwd.join(file),
        None => ComposeParser::find_compose_file(&cwd)
            .unwrap_or_else(|| cwd.join(DEFAULT_COMPOSE_FILE)),
    };

    let env: HashMap<String, String> = std::env::vars().collect();
    let project = ComposeParser::load_project(&compose_file, &env)?;

    // Relative mounts resolve against the directory holding the compose file
    let project_dir = compose_file
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| cwd.clone());

    let orchestrator =
        ComposeOrchestrator::new(project, ProcessRuntime::new(cli.runtime), project_dir);

    match cli.command {
        Commands::Start => {
            orchestrator.start().await.into_result()?;
        }
        Commands::Status => {
            orchestrator.status().await.into_result()?;
        }
        Commands::Stop => {
            orchestrator.stop().await?;
        }
        Commands::Run { service, args } => {
            let code = orchestrator.run(&service, args).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_passthrough_args() {
        let cli = Cli::try_parse_from(["quay", "run", "web", "--port", "80", "-v"]).unwrap();
        match cli.command {
            Commands::Run { service, args } => {
                assert_eq!(service, "web");
                assert_eq!(args, vec!["--port", "80", "-v"]);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "quay", "status", "--file", "stack.yml", "--runtime", "podman", "--debug",
        ])
        .unwrap();
        assert!(cli.debug);
        assert_eq!(cli.file, Some(PathBuf::from("stack.yml")));
        assert_eq!(cli.runtime, "podman");
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["quay", "restart"]).is_err());
    }
}
