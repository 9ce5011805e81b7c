//! Native application manifests.
//!
//! A native application is registered by dropping `<name>.json` into one of
//! the mail client's native-messaging host directories:
//!
//! ```json
//! {
//!   "name": "tbed",
//!   "description": "External editor bridge",
//!   "path": "/usr/local/bin/tbed-host",
//!   "type": "stdio",
//!   "allowed_extensions": ["tbed@tbed-rs"]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tbed_config::validate::is_valid_application_name;
use tracing::debug;

use crate::error::{ChannelError, ChannelResult};

/// Largest manifest file accepted.
const MAX_MANIFEST_SIZE: usize = 65_536;

/// Parsed contents of a host manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostManifest {
    /// Application name; must equal the file stem.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Absolute path of the executable.
    pub path: PathBuf,
    /// Connection type; only `"stdio"` is supported.
    #[serde(rename = "type")]
    pub kind: String,
    /// Extension ids allowed to connect.
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
}

impl HostManifest {
    /// Build a stdio manifest for `name` running `path`.
    #[must_use]
    pub fn stdio(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            path: path.into(),
            kind: "stdio".to_owned(),
            allowed_extensions: Vec::new(),
        }
    }

    /// Allow `extension_id` to connect.
    #[must_use]
    pub fn allow_extension(mut self, extension_id: impl Into<String>) -> Self {
        self.allowed_extensions.push(extension_id.into());
        self
    }

    /// Whether `extension_id` may connect.
    #[must_use]
    pub fn allows(&self, extension_id: &str) -> bool {
        self.allowed_extensions.iter().any(|e| e == extension_id)
    }
}

/// A manifest together with the file it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedManifest {
    /// Manifest file.
    pub file: PathBuf,
    /// Parsed manifest.
    pub manifest: HostManifest,
}

/// Looks up host manifests by application name.
#[derive(Debug, Clone)]
pub struct ManifestRegistry {
    dirs: Vec<PathBuf>,
}

impl Default for ManifestRegistry {
    fn default() -> Self {
        Self::new(default_manifest_dirs())
    }
}

impl ManifestRegistry {
    /// Search exactly `dirs`, in order.
    #[must_use]
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Search `extra` first, then the platform defaults.
    #[must_use]
    pub fn with_extra_dirs(extra: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut dirs: Vec<PathBuf> = extra.into_iter().collect();
        dirs.extend(default_manifest_dirs());
        Self { dirs }
    }

    /// Directories searched, in order.
    #[must_use]
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Resolve `application` and check that `extension_id` may use it.
    ///
    /// The first directory holding `<application>.json` wins.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NotRegistered`] if no manifest exists (or the
    /// name is not a valid application name) and
    /// [`ChannelError::InvalidManifest`] if the manifest is unreadable,
    /// malformed, names another application, is not a stdio host, or does
    /// not allow `extension_id`.
    pub async fn resolve(
        &self,
        application: &str,
        extension_id: &str,
    ) -> ChannelResult<ResolvedManifest> {
        if !is_valid_application_name(application) {
            return Err(ChannelError::NotRegistered {
                application: application.to_owned(),
                searched: Vec::new(),
            });
        }

        let file_name = format!("{application}.json");
        for dir in &self.dirs {
            let file = dir.join(&file_name);
            let content = match tokio::fs::read(&file).await {
                Ok(c) => c,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(invalid(&file, format!("unreadable: {e}"))),
            };
            debug!(path = %file.display(), "Found native application manifest");

            let manifest = parse_manifest(&file, &content)?;
            check_manifest(&file, &manifest, application, extension_id)?;
            return Ok(ResolvedManifest { file, manifest });
        }

        Err(ChannelError::NotRegistered {
            application: application.to_owned(),
            searched: self.dirs.clone(),
        })
    }
}

fn invalid(file: &Path, reason: impl Into<String>) -> ChannelError {
    ChannelError::InvalidManifest {
        path: file.to_path_buf(),
        reason: reason.into(),
    }
}

fn parse_manifest(file: &Path, content: &[u8]) -> ChannelResult<HostManifest> {
    if content.len() > MAX_MANIFEST_SIZE {
        return Err(invalid(
            file,
            format!("{} bytes exceeds the {MAX_MANIFEST_SIZE} byte limit", content.len()),
        ));
    }
    serde_json::from_slice(content).map_err(|e| invalid(file, e.to_string()))
}

fn check_manifest(
    file: &Path,
    manifest: &HostManifest,
    application: &str,
    extension_id: &str,
) -> ChannelResult<()> {
    if manifest.name != application {
        return Err(invalid(
            file,
            format!("declares name '{}', expected '{application}'", manifest.name),
        ));
    }
    if manifest.kind != "stdio" {
        return Err(invalid(
            file,
            format!("unsupported type '{}', expected 'stdio'", manifest.kind),
        ));
    }
    if !manifest.path.is_absolute() {
        return Err(invalid(file, "path must be absolute"));
    }
    if !manifest.allows(extension_id) {
        return Err(invalid(
            file,
            format!("extension '{extension_id}' is not in allowed_extensions"),
        ));
    }
    Ok(())
}

/// Per-user and system host directories for the current platform.
#[must_use]
pub fn default_manifest_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let home = directories::BaseDirs::new().map(|b| b.home_dir().to_path_buf());

    if cfg!(target_os = "macos") {
        if let Some(home) = home {
            dirs.push(home.join("Library/Application Support/Mozilla/NativeMessagingHosts"));
        }
        dirs.push(PathBuf::from(
            "/Library/Application Support/Mozilla/NativeMessagingHosts",
        ));
    } else if cfg!(unix) {
        if let Some(home) = home {
            dirs.push(home.join(".mozilla/native-messaging-hosts"));
        }
        dirs.push(PathBuf::from("/usr/lib/mozilla/native-messaging-hosts"));
        dirs.push(PathBuf::from("/usr/lib64/mozilla/native-messaging-hosts"));
    } else if let Some(data) = directories::BaseDirs::new() {
        dirs.push(data.data_dir().join("Mozilla").join("NativeMessagingHosts"));
    }
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(dir: &Path, name: &str, manifest: &HostManifest) {
        std::fs::write(
            dir.join(format!("{name}.json")),
            serde_json::to_vec(manifest).unwrap(),
        )
        .unwrap();
    }

    fn manifest() -> HostManifest {
        HostManifest::stdio("tbed", "/usr/local/bin/tbed-host").allow_extension("tbed@tbed-rs")
    }

    #[tokio::test]
    async fn test_resolve_first_match() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_manifest(second.path(), "tbed", &manifest());

        let registry =
            ManifestRegistry::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]);
        let resolved = registry.resolve("tbed", "tbed@tbed-rs").await.unwrap();
        assert_eq!(resolved.file, second.path().join("tbed.json"));
        assert_eq!(resolved.manifest, manifest());
    }

    #[tokio::test]
    async fn test_not_registered_lists_searched_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ManifestRegistry::new(vec![dir.path().to_path_buf()]);
        match registry.resolve("tbed", "tbed@tbed-rs").await {
            Err(ChannelError::NotRegistered { application, searched }) => {
                assert_eq!(application, "tbed");
                assert_eq!(searched, vec![dir.path().to_path_buf()]);
            },
            other => panic!("expected NotRegistered, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_name_is_not_registered() {
        let registry = ManifestRegistry::new(Vec::new());
        assert!(matches!(
            registry.resolve("../etc/passwd", "x").await,
            Err(ChannelError::NotRegistered { .. })
        ));
    }

    #[tokio::test]
    async fn test_name_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), "tbed", &HostManifest {
            name: "other".into(),
            ..manifest()
        });
        let registry = ManifestRegistry::new(vec![dir.path().to_path_buf()]);
        assert!(matches!(
            registry.resolve("tbed", "tbed@tbed-rs").await,
            Err(ChannelError::InvalidManifest { .. })
        ));
    }

    #[tokio::test]
    async fn test_extension_not_allowed() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), "tbed", &manifest());
        let registry = ManifestRegistry::new(vec![dir.path().to_path_buf()]);
        assert!(matches!(
            registry.resolve("tbed", "someone-else@example").await,
            Err(ChannelError::InvalidManifest { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tbed.json"), b"{ not json").unwrap();
        let registry = ManifestRegistry::new(vec![dir.path().to_path_buf()]);
        assert!(matches!(
            registry.resolve("tbed", "tbed@tbed-rs").await,
            Err(ChannelError::InvalidManifest { .. })
        ));
    }

    #[tokio::test]
    async fn test_non_stdio_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), "tbed", &HostManifest {
            kind: "pkcs11".into(),
            ..manifest()
        });
        let registry = ManifestRegistry::new(vec![dir.path().to_path_buf()]);
        assert!(matches!(
            registry.resolve("tbed", "tbed@tbed-rs").await,
            Err(ChannelError::InvalidManifest { .. })
        ));
    }

    #[test]
    fn test_extra_dirs_come_first() {
        let registry = ManifestRegistry::with_extra_dirs([PathBuf::from("/opt/tbed")]);
        assert_eq!(registry.dirs()[0], PathBuf::from("/opt/tbed"));
    }
}
