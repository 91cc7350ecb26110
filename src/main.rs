//! scopecss - CSS Modules scoped class names
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use scopecss::cli::{Cli, Commands};
use scopecss::config::ConfigManager;
use scopecss::error::{ScopeError, ScopeResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ScopeResult<()> {
    let cli = Cli::parse();

    // Escaping needs neither configuration nor logging
    match cli.command {
        Commands::Escape(args) => return scopecss::cli::commands::escape(args).await,
        Commands::Unescape(args) => return scopecss::cli::commands::unescape(args).await,
        _ => {}
    }

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    let cwd = std::env::current_dir().map_err(|e| ScopeError::io("getting current directory", e))?;

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        None
    } else {
        ConfigManager::find_local_config(&cwd)
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("scopecss=warn"),
        1 => EnvFilter::new("scopecss=info"),
        _ => EnvFilter::new("scopecss=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);
    if config.json_logs() {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match &local_config_path {
        Some(path) => debug!("Using local config: {}", path.display()),
        None if cli.no_local => debug!("Local config discovery disabled (--no-local)"),
        None => {}
    }

    // Paths in templates are relative to the local config's directory
    let base_dir = local_config_path
        .as_deref()
        .and_then(|path| path.parent())
        .map(|dir| dir.to_path_buf())
        .unwrap_or(cwd);

    match cli.command {
        Commands::Escape(_) | Commands::Unescape(_) => unreachable!("handled above"),
        Commands::Name(args) => scopecss::cli::commands::name(args, &config, &base_dir).await,
        Commands::Resolve(args) => {
            scopecss::cli::commands::resolve(args, &config, &base_dir).await
        }
        Commands::Config(args) => {
            scopecss::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
