//! Configuration utilities.

/// TOML configuration (`paypilot.toml`).
pub mod toml_config;
