//! `tbed config`: show and change configuration.

use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use tbed_config::loader::{CONFIG_FILE_NAME, collect_env_vars, config_directory};
use tbed_config::{ConfigStore, EditorConfig, FileConfigStore, ResolvedConfig};

/// Print the resolved configuration.
pub(crate) fn show_config(resolved: &ResolvedConfig, format: &str) -> Result<()> {
    let output = match format {
        "json" => serde_json::to_string_pretty(&resolved.config)?,
        "toml" => {
            let mut out = String::new();
            for file in &resolved.loaded_files {
                out.push_str(&format!("# loaded: {file}\n"));
            }
            for field in &resolved.env_fields {
                out.push_str(&format!("# from environment: {field}\n"));
            }
            out.push_str(&toml::to_string_pretty(&resolved.config)?);
            out
        },
        other => bail!("unknown format '{other}', expected toml or json"),
    };
    println!("{output}");
    Ok(())
}

fn config_path() -> Result<std::path::PathBuf> {
    let dir = config_directory(&collect_env_vars()).context("cannot locate config directory")?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Build the editor command from the `set` arguments.
fn editor_from_args(shell: Option<String>, path: Option<&Path>, args: &str) -> Result<EditorConfig> {
    match (shell, path) {
        (Some(shell), None) => Ok(EditorConfig::by_shell(shell)),
        (None, Some(path)) => Ok(EditorConfig::by_path(path, args)),
        _ => bail!("pass exactly one of --shell or --path"),
    }
}

/// Persist a new editor command.
pub(crate) async fn set_editor(shell: Option<String>, path: Option<&Path>, args: &str) -> Result<()> {
    let editor = editor_from_args(shell, path, args)?;
    let store = FileConfigStore::new(config_path()?);
    store.set(editor.clone()).await?;
    println!(
        "{} {} ({})",
        "editor set:".green().bold(),
        editor.command,
        store.path().display()
    );
    Ok(())
}

/// Print the config file location.
pub(crate) fn show_path() -> Result<()> {
    let path = config_path()?;
    let status = if path.exists() { "found" } else { "not found" };
    println!("{}  [{status}]", path.display());
    println!("\nEnvironment variables:");
    println!("  TBED_HOME   -> config directory");
    println!("  TBED_EDITOR -> editor.command (when unset in the file)");
    println!("  TBED_LOG    -> logging.level");
    Ok(())
}
