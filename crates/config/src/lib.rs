//! Configuration loading, validation and env substitution.
//!
//! Config files: `autocontinue.toml`, `autocontinue.yaml`, or `autocontinue.json`
//! Searched in `./` then `~/.config/autocontinue/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution in all values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod template;
pub mod validate;

pub use {
    loader::{
        apply_env_overrides, config_dir, data_dir, default_profile_dir, discover_and_load,
        expand_home, find_config_file, load_config, load_from,
        write_config_file,
    },
    schema::{
        AutocontinueConfig, BackoffConfig, BackoffKind, BrowserConfig, MonitorConfig,
        ProbeErrorPolicy, TargetConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
