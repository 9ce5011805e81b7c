//! tbed CLI - edit text in an external editor through a native application.
//!
//! The CLI treats a file as the compose target: its contents go to the
//! registered native application, and the edited text comes back into the
//! same file.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod surface;

use commands::{config, edit, manifest};

/// tbed - external editor bridge
#[derive(Parser)]
#[command(name = "tbed")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit a file in the configured external editor
    Edit {
        /// File holding the draft
        file: PathBuf,

        /// Native application to connect to
        #[arg(short, long)]
        application: Option<String>,

        /// Extra directory searched for host manifests (repeatable)
        #[arg(long = "manifest-dir")]
        manifest_dirs: Vec<PathBuf>,
    },

    /// View and change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Inspect native application manifests
    Manifest {
        #[command(subcommand)]
        command: ManifestCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration
    Show {
        /// Output format: toml (default) or json
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// Set the editor command
    Set {
        /// Free-form shell invocation
        #[arg(long, conflicts_with_all = ["path", "args"], required_unless_present = "path")]
        shell: Option<String>,

        /// Editor executable
        #[arg(long)]
        path: Option<PathBuf>,

        /// Arguments passed after the executable
        #[arg(long, requires = "path", default_value = "")]
        args: String,
    },
    /// Show the configuration file location
    Path,
}

#[derive(Subcommand)]
enum ManifestCommands {
    /// Resolve and validate a host manifest
    Check {
        /// Application name (defaults to the configured one)
        name: Option<String>,

        /// Extra directory searched for host manifests (repeatable)
        #[arg(long = "manifest-dir")]
        manifest_dirs: Vec<PathBuf>,
    },
}

fn init_logging(resolved: Option<&tbed_config::ResolvedConfig>, verbose: bool) {
    let mut log_config = resolved
        .and_then(|r| tbed_telemetry::LogConfig::from_config(&r.config.logging).ok())
        .unwrap_or_else(|| tbed_telemetry::LogConfig::new("info"));
    if verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = tbed_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A broken config file must not prevent `config set` from repairing it.
    let resolved = tbed_config::Config::load();
    init_logging(resolved.as_ref().ok(), cli.verbose);

    match cli.command {
        Commands::Edit {
            file,
            application,
            manifest_dirs,
        } => {
            let resolved = resolved?;
            edit::run_edit(&resolved, &file, application, manifest_dirs).await?;
        },
        Commands::Config { command } => handle_config(command, resolved).await?,
        Commands::Manifest { command } => match command {
            ManifestCommands::Check {
                name,
                manifest_dirs,
            } => {
                let resolved = resolved?;
                manifest::check_manifest(&resolved.config.bridge, name, manifest_dirs).await?;
            },
        },
    }

    Ok(())
}

async fn handle_config(
    command: ConfigCommands,
    resolved: tbed_config::ConfigResult<tbed_config::ResolvedConfig>,
) -> Result<()> {
    match command {
        ConfigCommands::Show { format } => config::show_config(&resolved?, &format),
        ConfigCommands::Set { shell, path, args } => {
            config::set_editor(shell, path.as_deref(), &args).await
        },
        ConfigCommands::Path => config::show_path(),
    }
}
