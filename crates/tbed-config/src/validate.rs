//! Post-merge configuration validation.
//!
//! Validates that deserialized [`Config`](crate::Config) values are within
//! the protocol's limits and that names are well formed.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{BridgeConfig, Config, EditorConfig, MAX_INBOUND_LIMIT, MAX_OUTBOUND_LIMIT};

/// Validate a fully-merged and deserialized configuration.
///
/// An empty editor command is allowed here; it is rejected when a session
/// asks the [`ConfigStore`](crate::ConfigStore) for it.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_editor(&config.editor)?;
    validate_bridge(&config.bridge)?;
    validate_logging(config)?;
    Ok(())
}

/// Validate an editor section on its own.
///
/// # Errors
///
/// Returns a [`ConfigError::ValidationError`] if the command spans lines or
/// contains NUL bytes.
pub fn validate_editor(editor: &EditorConfig) -> ConfigResult<()> {
    if editor.command.contains(['\n', '\r']) {
        return Err(ConfigError::ValidationError {
            field: "editor.command".to_owned(),
            message: "command must be a single line".to_owned(),
        });
    }
    if editor.command.contains('\0') {
        return Err(ConfigError::ValidationError {
            field: "editor.command".to_owned(),
            message: "command must not contain NUL bytes".to_owned(),
        });
    }
    Ok(())
}

/// Whether `name` is a valid native-messaging application name.
///
/// Names are dot-separated runs of ASCII alphanumerics and underscores
/// (`^\w+(\.\w+)*$`).
#[must_use]
pub fn is_valid_application_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'_')
        })
}

fn validate_bridge(bridge: &BridgeConfig) -> ConfigResult<()> {
    if !is_valid_application_name(&bridge.application) {
        return Err(ConfigError::ValidationError {
            field: "bridge.application".to_owned(),
            message: format!(
                "'{}' is not a valid native application name (dot-separated words of letters, digits and '_')",
                bridge.application
            ),
        });
    }

    if bridge.hotkey_command.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "bridge.hotkey_command".to_owned(),
            message: "hotkey command name must not be empty".to_owned(),
        });
    }

    if bridge.outbound_limit == 0 || bridge.outbound_limit > MAX_OUTBOUND_LIMIT {
        return Err(ConfigError::ValidationError {
            field: "bridge.outbound_limit".to_owned(),
            message: format!("outbound_limit must be between 1 and {MAX_OUTBOUND_LIMIT}"),
        });
    }

    if bridge.inbound_limit == 0 || bridge.inbound_limit > MAX_INBOUND_LIMIT {
        return Err(ConfigError::ValidationError {
            field: "bridge.inbound_limit".to_owned(),
            message: format!("inbound_limit must be between 1 and {MAX_INBOUND_LIMIT}"),
        });
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if !matches!(
        l.level.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error" | "off"
    ) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported level '{}'; expected one of: trace, debug, info, warn, error, off",
                l.level
            ),
        });
    }

    if !matches!(l.format.as_str(), "pretty" | "compact" | "json" | "full") {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported format '{}'; expected one of: pretty, compact, json, full",
                l.format
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_application_names() {
        assert!(is_valid_application_name("tbed"));
        assert!(is_valid_application_name("org.example.tbed_host"));
        assert!(!is_valid_application_name(""));
        assert!(!is_valid_application_name("tbed."));
        assert!(!is_valid_application_name(".tbed"));
        assert!(!is_valid_application_name("tb-ed"));
        assert!(!is_valid_application_name("../tbed"));
    }

    #[test]
    fn test_invalid_application_rejected() {
        let mut config = Config::default();
        config.bridge.application = "bad/name".to_owned();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::ValidationError { field, .. }) if field == "bridge.application"
        ));
    }

    #[test]
    fn test_limits_bounded_by_protocol() {
        let mut config = Config::default();
        config.bridge.outbound_limit = MAX_OUTBOUND_LIMIT + 1;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.bridge.inbound_limit = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_multiline_command_rejected() {
        let editor = EditorConfig::by_shell("vim\nrm -rf ~");
        assert!(validate_editor(&editor).is_err());
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut config = Config::default();
        config.logging.format = "xml".to_owned();
        assert!(validate(&config).is_err());
    }
}
