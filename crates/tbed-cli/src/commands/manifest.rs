//! `tbed manifest`: inspect host manifests.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use tbed_bridge::ManifestRegistry;
use tbed_config::BridgeConfig;

/// Resolve `name` (or the configured application) and report the result.
pub(crate) async fn check_manifest(
    bridge: &BridgeConfig,
    name: Option<String>,
    manifest_dirs: Vec<PathBuf>,
) -> Result<()> {
    let name = name.unwrap_or_else(|| bridge.application.clone());
    let registry = ManifestRegistry::with_extra_dirs(
        manifest_dirs
            .into_iter()
            .chain(bridge.manifest_dirs.iter().cloned()),
    );

    let resolved = registry.resolve(&name, &bridge.extension_id).await?;
    let program = &resolved.manifest.path;

    println!("{} {name}", "manifest ok:".green().bold());
    println!("  file:       {}", resolved.file.display());
    println!("  executable: {}", program.display());
    if !resolved.manifest.description.is_empty() {
        println!("  about:      {}", resolved.manifest.description);
    }
    if tokio::fs::metadata(program).await.is_err() {
        println!("  {} executable does not exist", "warning:".yellow().bold());
    }
    Ok(())
}
