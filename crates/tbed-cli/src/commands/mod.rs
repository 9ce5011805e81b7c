//! CLI command handlers.

pub(crate) mod config;
pub(crate) mod edit;
pub(crate) mod manifest;
