//! Editor-command persistence.
//!
//! The bridge persists exactly one piece of state: the [`EditorConfig`].
//! [`ConfigStore`] abstracts where it lives so sessions can be tested without
//! touching disk.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::loader::check_size;
use crate::types::EditorConfig;
use crate::validate::validate_editor;

/// Read and write access to the configured editor command.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// The stored editor command.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEditor`] when no command is set.
    async fn get(&self) -> ConfigResult<EditorConfig>;

    /// Replace the stored editor command.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed commands, or an IO error if
    /// the store cannot be written.
    async fn set(&self, editor: EditorConfig) -> ConfigResult<()>;
}

fn require_configured(editor: EditorConfig) -> ConfigResult<EditorConfig> {
    if editor.is_configured() {
        Ok(editor)
    } else {
        Err(ConfigError::MissingEditor)
    }
}

// ---------------------------------------------------------------------------
// MemoryConfigStore
// ---------------------------------------------------------------------------

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    editor: RwLock<EditorConfig>,
}

impl MemoryConfigStore {
    /// Create a store holding `editor`.
    #[must_use]
    pub fn new(editor: EditorConfig) -> Self {
        Self {
            editor: RwLock::new(editor),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self) -> ConfigResult<EditorConfig> {
        let editor = self
            .editor
            .read()
            .map_err(|e| ConfigError::Internal(e.to_string()))?
            .clone();
        require_configured(editor)
    }

    async fn set(&self, editor: EditorConfig) -> ConfigResult<()> {
        validate_editor(&editor)?;
        *self
            .editor
            .write()
            .map_err(|e| ConfigError::Internal(e.to_string()))? = editor;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileConfigStore
// ---------------------------------------------------------------------------

/// Store backed by the `[editor]` table of a TOML config file.
///
/// Writes preserve every other table in the file.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Create a store for the config file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> ConfigResult<toml::Table> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "config file not found, starting empty");
                return Ok(toml::Table::new());
            },
            Err(e) => {
                return Err(ConfigError::ReadError {
                    path: self.path.display().to_string(),
                    source: e,
                });
            },
        };
        check_size(&self.path, &content)?;
        content.parse::<toml::Table>().map_err(|e| ConfigError::ParseError {
            path: self.path.display().to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn get(&self) -> ConfigResult<EditorConfig> {
        let mut document = self.read_document().await?;
        let editor = match document.remove("editor") {
            Some(value) => {
                value
                    .try_into()
                    .map_err(|e: toml::de::Error| ConfigError::ParseError {
                        path: self.path.display().to_string(),
                        source: e,
                    })?
            },
            None => EditorConfig::default(),
        };
        require_configured(editor)
    }

    async fn set(&self, editor: EditorConfig) -> ConfigResult<()> {
        validate_editor(&editor)?;

        let mut document = self.read_document().await?;
        document.insert("editor".to_owned(), toml::Value::try_from(&editor)?);
        let content = toml::to_string_pretty(&document)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::WriteError {
                    path: parent.display().to_string(),
                    source: e,
                })?;
        }
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| ConfigError::WriteError {
                path: self.path.display().to_string(),
                source: e,
            })?;

        info!(path = %self.path.display(), mode = ?editor.selection_mode, "editor command saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SelectionMode;

    #[tokio::test]
    async fn test_memory_store_missing_editor() {
        let store = MemoryConfigStore::default();
        assert!(matches!(store.get().await, Err(ConfigError::MissingEditor)));
    }

    #[tokio::test]
    async fn test_memory_store_set_then_get() {
        let store = MemoryConfigStore::default();
        store
            .set(EditorConfig::by_path("/usr/bin/vim", "-f"))
            .await
            .unwrap();
        let editor = store.get().await.unwrap();
        assert_eq!(editor.command, "/usr/bin/vim -f");
        assert_eq!(editor.selection_mode, SelectionMode::ByPath);
    }

    #[tokio::test]
    async fn test_memory_store_rejects_invalid() {
        let store = MemoryConfigStore::new(EditorConfig::by_shell("vim"));
        assert!(store.set(EditorConfig::by_shell("vim\nx")).await.is_err());
        assert_eq!(store.get().await.unwrap().command, "vim");
    }

    #[tokio::test]
    async fn test_file_store_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::new(dir.path().join("config.toml"));
        assert!(matches!(store.get().await, Err(ConfigError::MissingEditor)));
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let store = FileConfigStore::new(&path);

        store
            .set(EditorConfig::by_shell("xterm -e vim"))
            .await
            .unwrap();
        assert!(path.exists());
        assert_eq!(store.get().await.unwrap().command, "xterm -e vim");
    }

    #[tokio::test]
    async fn test_file_store_preserves_other_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[bridge]\napplication = \"org.example.tbed\"\n\n[editor]\ncommand = \"ed\"\n",
        )
        .unwrap();

        let store = FileConfigStore::new(&path);
        store
            .set(EditorConfig::by_path("/usr/bin/emacs", ""))
            .await
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("org.example.tbed"));
        let loaded = crate::loader::load_file(&path).unwrap();
        assert_eq!(loaded.editor.command, "/usr/bin/emacs");
        assert_eq!(loaded.bridge.application, "org.example.tbed");
    }
}
