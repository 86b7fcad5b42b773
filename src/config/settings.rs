//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.  Every field carries a
//! serde default, so a partial `settings.toml` is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AppPaths;
use crate::engine::{
    EngineConfig, LanguageModelConfig, DEFAULT_BEAM_WIDTH, DEFAULT_LM_ALPHA, DEFAULT_LM_BETA,
    DEFAULT_N_CONTEXT, DEFAULT_N_FEATURES,
};
use crate::worker::{ShutdownPolicy, WorkerOptions};

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Settings that cannot be turned into a runnable configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no model path configured (use --model or [engine].model)")]
    MissingModel,

    #[error("no alphabet path configured (use --alphabet or [engine].alphabet)")]
    MissingAlphabet,

    /// Exactly one of the language model and its trie was given.
    #[error("language model and trie must be given together (got only the {present})")]
    IncompleteLanguageModel { present: &'static str },

    #[error("heartbeat interval must be > 0 ms")]
    ZeroHeartbeat,
}

// ---------------------------------------------------------------------------
// EngineSettings
// ---------------------------------------------------------------------------

/// Model files and decoder tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Acoustic model file (GGML for the whisper backend).
    pub model: Option<PathBuf>,
    /// `alphabet.txt`: one output symbol per line.
    pub alphabet: Option<PathBuf>,
    /// Optional language-model binary; requires `trie`.
    pub lm: Option<PathBuf>,
    /// Optional trie for the language model; requires `lm`.
    pub trie: Option<PathBuf>,
    /// ISO-639-1 speech language.
    pub language: String,
    pub n_features: u32,
    pub n_context: u32,
    pub beam_width: u32,
    pub lm_alpha: f32,
    pub lm_beta: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            model: None,
            alphabet: None,
            lm: None,
            trie: None,
            language: "en".into(),
            n_features: DEFAULT_N_FEATURES,
            n_context: DEFAULT_N_CONTEXT,
            beam_width: DEFAULT_BEAM_WIDTH,
            lm_alpha: DEFAULT_LM_ALPHA,
            lm_beta: DEFAULT_LM_BETA,
        }
    }
}

// ---------------------------------------------------------------------------
// WorkerSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// `drain` or `immediate`.
    pub shutdown_policy: ShutdownPolicy,
    /// Idle heartbeat log interval.
    pub heartbeat_ms: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            shutdown_policy: ShutdownPolicy::default(),
            heartbeat_ms: 300,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// egui window settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Last saved window position `(x, y)` in screen pixels.  `None` lets
    /// the window manager pick.
    pub window_position: Option<(f32, f32)>,
    pub always_on_top: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_position: None,
            always_on_top: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```toml
/// [engine]
/// model = "/models/ggml-base.en.bin"
/// alphabet = "/models/alphabet.txt"
/// beam_width = 500
///
/// [worker]
/// shutdown_policy = "drain"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineSettings,
    pub worker: WorkerSettings,
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Write the configuration to `path`, creating parent directories as
    /// needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build the engine configuration.  File readability is checked later by
    /// [`EngineConfig::validate`].
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let e = &self.engine;
        let model = e.model.clone().ok_or(ConfigError::MissingModel)?;
        let alphabet = e.alphabet.clone().ok_or(ConfigError::MissingAlphabet)?;

        let language_model = match (&e.lm, &e.trie) {
            (Some(lm), Some(trie)) => Some(LanguageModelConfig {
                alpha: e.lm_alpha,
                beta: e.lm_beta,
                ..LanguageModelConfig::new(lm, trie)
            }),
            (Some(_), None) => {
                return Err(ConfigError::IncompleteLanguageModel {
                    present: "language model",
                })
            }
            (None, Some(_)) => return Err(ConfigError::IncompleteLanguageModel { present: "trie" }),
            (None, None) => None,
        };

        Ok(EngineConfig {
            n_features: e.n_features,
            n_context: e.n_context,
            beam_width: e.beam_width,
            language: e.language.clone(),
            language_model,
            ..EngineConfig::new(model, alphabet)
        })
    }

    pub fn worker_options(&self) -> Result<WorkerOptions, ConfigError> {
        if self.worker.heartbeat_ms == 0 {
            return Err(ConfigError::ZeroHeartbeat);
        }
        Ok(WorkerOptions {
            shutdown_policy: self.worker.shutdown_policy,
            heartbeat: Duration::from_millis(self.worker.heartbeat_ms),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
