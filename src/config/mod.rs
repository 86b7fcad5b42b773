//! Configuration module.
//!
//! Provides `AppConfig` (engine, worker and UI sections), `AppPaths` for the
//! platform config directory, and TOML persistence via `AppConfig::load` /
//! `AppConfig::save_to`.  Command-line overrides live in [`crate::cli`].

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, ConfigError, EngineSettings, UiConfig, WorkerSettings};
