#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]
//! Configuration for the tbed editor bridge.
//!
//! This crate provides a single [`Config`] type with three sections:
//!
//! - `[editor]`: the external editor command and how it was chosen
//! - `[bridge]`: native application name, hotkey command, size limits
//! - `[logging]`: level, format and optional log directory
//!
//! # Usage
//!
//! ```rust,no_run
//! use tbed_config::Config;
//!
//! // Load with full precedence chain (defaults → user file → env).
//! let resolved = Config::load().unwrap();
//! println!("Editor: {}", resolved.config.editor.command);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **`TBED_LOG`**, which always sets the log level
//! 2. **User** (`$TBED_HOME/config.toml`, or the platform config directory)
//! 3. **`TBED_EDITOR`**, used only while no editor command is set
//! 4. **Embedded defaults** (`defaults.toml` compiled into binary)
//!
//! The `[editor]` section is the only state the bridge itself persists; it is
//! read and written through the [`ConfigStore`] trait.

/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Editor-command persistence.
pub mod store;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

// Re-export primary types at the crate root.
pub use error::{ConfigError, ConfigResult};
pub use loader::ResolvedConfig;
pub use store::{ConfigStore, FileConfigStore, MemoryConfigStore};
pub use types::*;

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// See [`loader::load`] for the full algorithm.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the config file is malformed or the final
    /// configuration fails validation.
    pub fn load() -> ConfigResult<ResolvedConfig> {
        loader::load(None)
    }

    /// Load configuration with an explicit configuration directory.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the config file is malformed or the final
    /// configuration fails validation.
    pub fn load_with_home(home_dir: &std::path::Path) -> ConfigResult<ResolvedConfig> {
        loader::load(Some(home_dir))
    }
}
