//! Configuration types for the tbed bridge.
//!
//! Every struct implements [`Default`] so that a bare `[section]` header in
//! TOML produces a working configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External editor selection.
    pub editor: EditorConfig,
    /// Native-messaging channel settings.
    pub bridge: BridgeConfig,
    /// Logging level and format.
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// EditorConfig
// ---------------------------------------------------------------------------

/// How the editor command was chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// An executable path plus an optional argument string.
    ByPath,
    /// A free-form shell invocation.
    #[default]
    ByShell,
}

/// The external editor command.
///
/// `command` is opaque to the bridge: it is forwarded verbatim in the
/// `Command:` header and interpreted by the native application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Executable path or shell invocation, with arguments.
    pub command: String,
    /// How `command` was entered.
    pub selection_mode: SelectionMode,
}

impl EditorConfig {
    /// Build a command from an executable path and an argument string.
    #[must_use]
    pub fn by_path(path: impl AsRef<Path>, args: &str) -> Self {
        let mut command = path.as_ref().display().to_string();
        let args = args.trim();
        if !args.is_empty() {
            command.push(' ');
            command.push_str(args);
        }
        Self {
            command,
            selection_mode: SelectionMode::ByPath,
        }
    }

    /// Store a shell invocation verbatim.
    #[must_use]
    pub fn by_shell(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            selection_mode: SelectionMode::ByShell,
        }
    }

    /// Whether a non-blank command is set.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.command.trim().is_empty()
    }

    /// The first whitespace-separated word of the command.
    #[must_use]
    pub fn program(&self) -> Option<&str> {
        self.command.split_whitespace().next()
    }

    /// Everything after the first word, trimmed.
    #[must_use]
    pub fn arguments(&self) -> &str {
        let trimmed = self.command.trim_start();
        trimmed
            .find(char::is_whitespace)
            .map_or("", |idx| trimmed[idx..].trim())
    }
}

// ---------------------------------------------------------------------------
// BridgeConfig
// ---------------------------------------------------------------------------

/// Native-messaging channel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Registered native application name.
    pub application: String,
    /// Name of the hotkey command that triggers an edit.
    pub hotkey_command: String,
    /// Extension id passed to the native application and checked against
    /// the manifest's `allowed_extensions`.
    pub extension_id: String,
    /// Largest draft, in bytes, sent to the native application.
    pub outbound_limit: u64,
    /// Largest frame, in bytes, accepted from the native application.
    pub inbound_limit: u32,
    /// Extra directories searched for native application manifests, ahead
    /// of the platform defaults.
    pub manifest_dirs: Vec<PathBuf>,
}

/// Protocol ceiling for [`BridgeConfig::outbound_limit`].
pub const MAX_OUTBOUND_LIMIT: u64 = 4_294_967_296;

/// Protocol ceiling for [`BridgeConfig::inbound_limit`].
pub const MAX_INBOUND_LIMIT: u32 = 1_048_576;

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            application: "tbed".to_owned(),
            hotkey_command: "tbed".to_owned(),
            extension_id: "tbed@tbed-rs".to_owned(),
            outbound_limit: MAX_OUTBOUND_LIMIT,
            inbound_limit: MAX_INBOUND_LIMIT,
            manifest_dirs: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingConfig
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["tbed_protocol=trace"]`).
    pub directives: Vec<String>,
    /// Write logs to rolling files in this directory instead of stderr.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            directory: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_path_joins_arguments() {
        let cfg = EditorConfig::by_path("/usr/bin/gvim", "  -f --nofork ");
        assert_eq!(cfg.command, "/usr/bin/gvim -f --nofork");
        assert_eq!(cfg.selection_mode, SelectionMode::ByPath);
        assert_eq!(cfg.program(), Some("/usr/bin/gvim"));
        assert_eq!(cfg.arguments(), "-f --nofork");
    }

    #[test]
    fn test_by_path_without_arguments() {
        let cfg = EditorConfig::by_path("/usr/bin/vim", "");
        assert_eq!(cfg.command, "/usr/bin/vim");
        assert_eq!(cfg.arguments(), "");
    }

    #[test]
    fn test_by_shell_is_verbatim() {
        let cfg = EditorConfig::by_shell("xterm -e 'vim +startinsert'");
        assert_eq!(cfg.command, "xterm -e 'vim +startinsert'");
        assert_eq!(cfg.selection_mode, SelectionMode::ByShell);
        assert!(cfg.is_configured());
    }

    #[test]
    fn test_unconfigured_editor() {
        assert!(!EditorConfig::default().is_configured());
        assert!(!EditorConfig::by_shell("   ").is_configured());
        assert_eq!(EditorConfig::default().program(), None);
    }

    #[test]
    fn test_selection_mode_serialization() {
        let toml = toml::to_string(&EditorConfig::by_path("/bin/ed", "")).unwrap();
        assert!(toml.contains("selection_mode = \"by_path\""));
    }
}
