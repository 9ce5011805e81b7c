//! Config file discovery and layered loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge the user file (`{config dir}/config.toml`)
//! 3. Apply env var fallbacks for unset fields
//! 4. Deserialize merged tree → `Config`
//! 5. Validate
//! 6. Return `ResolvedConfig`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// A loaded configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final configuration.
    pub config: Config,
    /// Path of the user config file (whether or not it exists).
    pub path: PathBuf,
    /// Files that were actually read, in merge order.
    pub loaded_files: Vec<String>,
    /// Fields filled from environment variables.
    pub env_fields: Vec<String>,
}

/// Load the configuration with layered precedence.
///
/// `home_override` replaces the configuration directory, bypassing
/// `TBED_HOME` and the platform default.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the config file is malformed, or if the
/// final merged configuration fails validation.
pub fn load(home_override: Option<&Path>) -> ConfigResult<ResolvedConfig> {
    let env_vars = collect_env_vars();
    let dir = match home_override {
        Some(dir) => dir.to_path_buf(),
        None => config_directory(&env_vars)?,
    };
    load_from(&dir.join(CONFIG_FILE_NAME), &env_vars)
}

/// Load with an explicit user file path and environment snapshot.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the config file is malformed, or if the
/// final merged configuration fails validation.
pub fn load_from(path: &Path, env_vars: &HashMap<String, String>) -> ConfigResult<ResolvedConfig> {
    // 1. Parse embedded defaults.
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut loaded_files = Vec::new();

    // 2. User config.
    if let Some(overlay) = try_load_file(path)? {
        deep_merge(&mut merged, &overlay);
        loaded_files.push(path.display().to_string());
        info!(path = %path.display(), "loaded user config");
    }

    // 3. Apply env var fallbacks for unset fields.
    let env_fields = apply_env_fallbacks(&mut merged, env_vars);
    if !env_fields.is_empty() {
        debug!(fields = ?env_fields, "applied environment variable fallbacks");
    }

    // 4. Deserialize.
    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    // 5. Validate.
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        path: path.to_path_buf(),
        loaded_files,
        env_fields,
    })
}

/// Load a config from a specific file path (no layering, no env).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let Some(value) = try_load_file(path)? else {
        return Err(ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    };
    let config: Config = value
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })?;

    validate::validate(&config)?;
    Ok(config)
}

/// Determine the configuration directory.
///
/// `TBED_HOME` wins when set; otherwise the platform config directory
/// (`~/.config/tbed` on Linux).
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDir`] when no directory can be determined.
pub fn config_directory(env_vars: &HashMap<String, String>) -> ConfigResult<PathBuf> {
    if let Some(home) = env_vars.get("TBED_HOME").filter(|h| !h.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    directories::ProjectDirs::from("", "", "tbed")
        .map(|d| d.config_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

/// Snapshot `TBED_*` environment variables.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("TBED_"))
        .collect()
}

/// Read a TOML file, returning `None` if the file doesn't exist.
///
/// Uses a single read operation to avoid TOCTOU races (no separate
/// exists/metadata checks before reading).
pub(crate) fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    check_size(path, &content)?;

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

pub(crate) fn check_size(path: &Path, content: &str) -> ConfigResult<()> {
    let len = u64::try_from(content.len()).unwrap_or(u64::MAX);
    if len > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {len} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit"
            ),
        });
    }
    Ok(())
}

/// Recursively deep-merge `overlay` into `base`.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

/// Env var → (section, key, always override).
///
/// `TBED_EDITOR` only fills an empty command; `TBED_LOG` always wins.
const ENV_FALLBACKS: &[(&str, &str, &str, bool)] = &[
    ("TBED_EDITOR", "editor", "command", false),
    ("TBED_LOG", "logging", "level", true),
];

/// Apply environment variables to the merged tree.
fn apply_env_fallbacks(
    merged: &mut toml::Value,
    env_vars: &HashMap<String, String>,
) -> Vec<String> {
    let mut applied = Vec::new();
    for (var, section, key, always) in ENV_FALLBACKS {
        let Some(value) = env_vars.get(*var).filter(|v| !v.is_empty()) else {
            continue;
        };
        let Some(table) = merged.get_mut(*section).and_then(toml::Value::as_table_mut) else {
            continue;
        };
        let is_unset = table
            .get(*key)
            .and_then(toml::Value::as_str)
            .is_none_or(|s| s.trim().is_empty());
        if *always || is_unset {
            table.insert((*key).to_owned(), toml::Value::String(value.clone()));
            applied.push(format!("{section}.{key}"));
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SelectionMode;

    #[test]
    fn test_defaults_parse() {
        let val: toml::Value = toml::from_str(DEFAULTS_TOML).unwrap();
        assert!(val.as_table().unwrap().contains_key("editor"));
        assert!(val.as_table().unwrap().contains_key("bridge"));
        assert!(val.as_table().unwrap().contains_key("logging"));
    }

    #[test]
    fn test_defaults_deserialize_to_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = load_from(&dir.path().join("config.toml"), &HashMap::new()).unwrap();
        assert_eq!(resolved.config, Config::default());
        assert!(resolved.loaded_files.is_empty());
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [editor]
            command = "/usr/bin/vim"
            selection_mode = "by_path"

            [bridge]
            application = "org.example.tbed"
            "#,
        )
        .unwrap();

        let resolved = load_from(&path, &HashMap::new()).unwrap();
        assert_eq!(resolved.config.editor.command, "/usr/bin/vim");
        assert_eq!(resolved.config.editor.selection_mode, SelectionMode::ByPath);
        assert_eq!(resolved.config.bridge.application, "org.example.tbed");
        assert_eq!(resolved.config.bridge.hotkey_command, "tbed");
        assert_eq!(resolved.loaded_files.len(), 1);
    }

    #[test]
    fn test_env_fallback_only_fills_unset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let env: HashMap<String, String> = [
            ("TBED_EDITOR".to_owned(), "nano".to_owned()),
            ("TBED_LOG".to_owned(), "debug".to_owned()),
        ]
        .into_iter()
        .collect();

        let resolved = load_from(&path, &env).unwrap();
        assert_eq!(resolved.config.editor.command, "nano");
        assert_eq!(resolved.config.logging.level, "debug");

        std::fs::write(&path, "[editor]\ncommand = \"vim\"\n").unwrap();
        let resolved = load_from(&path, &env).unwrap();
        assert_eq!(resolved.config.editor.command, "vim");
        assert_eq!(resolved.env_fields, vec!["logging.level".to_owned()]);
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[editor\ncommand = ").unwrap();
        assert!(matches!(
            load_from(&path, &HashMap::new()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_validation_runs_after_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[bridge]\ninbound_limit = 0\n").unwrap();
        assert!(matches!(
            load_from(&path, &HashMap::new()),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_config_directory_prefers_tbed_home() {
        let env: HashMap<String, String> =
            [("TBED_HOME".to_owned(), "/tmp/tbed-home".to_owned())]
                .into_iter()
                .collect();
        assert_eq!(
            config_directory(&env).unwrap(),
            PathBuf::from("/tmp/tbed-home")
        );
    }

    #[test]
    fn test_load_file_nonexistent() {
        let result = load_file(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_try_load_file_missing() {
        let result = try_load_file(Path::new("/nonexistent/config.toml")).unwrap();
        assert!(result.is_none());
    }
}
