//! `tbed edit`: run one edit session on a file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use tbed_bridge::{Bridge, ManifestRegistry, ProcessHost};
use tbed_config::{BridgeConfig, MemoryConfigStore, ResolvedConfig};
use tracing::debug;

use crate::surface::FileSurface;

/// Bridge settings for this invocation.
fn bridge_config(
    base: &BridgeConfig,
    application: Option<String>,
    manifest_dirs: Vec<PathBuf>,
) -> BridgeConfig {
    let mut config = base.clone();
    if let Some(application) = application {
        config.application = application;
    }
    let mut dirs = manifest_dirs;
    dirs.append(&mut config.manifest_dirs);
    config.manifest_dirs = dirs;
    config
}

/// Send `file` to the native application and write the reply back.
pub(crate) async fn run_edit(
    resolved: &ResolvedConfig,
    file: &Path,
    application: Option<String>,
    manifest_dirs: Vec<PathBuf>,
) -> Result<()> {
    let config = bridge_config(&resolved.config.bridge, application, manifest_dirs);
    let registry = ManifestRegistry::with_extra_dirs(config.manifest_dirs.clone());
    debug!(dirs = ?registry.dirs(), "Manifest search path");

    let host = ProcessHost::new(registry, config.extension_id.clone())
        .with_max_inbound(config.inbound_limit);
    let store = MemoryConfigStore::new(resolved.config.editor.clone());
    let bridge = Bridge::new(
        Arc::new(FileSurface),
        Arc::new(host),
        Arc::new(store),
        config,
    );

    let outcome = bridge
        .edit(FileSurface::target(file))
        .await
        .with_context(|| format!("failed to edit {}", file.display()))?;

    println!(
        "{} {} ({} bytes out, {} bytes in, {} pages)",
        "edited".green().bold(),
        file.display(),
        outcome.bytes_sent,
        outcome.bytes_received,
        outcome.pages
    );
    Ok(())
}
