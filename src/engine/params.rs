//! Engine construction parameters.
//!
//! [`EngineConfig`] replaces a set of global tuning constants: the defaults
//! below are applied by [`EngineConfig::new`] and every field stays
//! overridable before the engine is built.

use std::fs::File;
use std::path::{Path, PathBuf};

use super::adapter::EngineError;

/// Number of MFCC features per frame.
pub const DEFAULT_N_FEATURES: u32 = 26;
/// Frames of context on each side of the current frame.
pub const DEFAULT_N_CONTEXT: u32 = 9;
/// Decoder beam width.
pub const DEFAULT_BEAM_WIDTH: u32 = 500;
/// Language-model weight.
pub const DEFAULT_LM_ALPHA: f32 = 0.75;
/// Word insertion bonus.
pub const DEFAULT_LM_BETA: f32 = 1.85;

// ---------------------------------------------------------------------------
// LanguageModelConfig
// ---------------------------------------------------------------------------

/// Optional word-level scorer: a language-model binary plus its trie.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageModelConfig {
    pub binary_path: PathBuf,
    pub trie_path: PathBuf,
    pub alpha: f32,
    pub beta: f32,
}

impl LanguageModelConfig {
    /// Scorer with the default α/β weighting.
    pub fn new(binary_path: impl Into<PathBuf>, trie_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
            trie_path: trie_path.into(),
            alpha: DEFAULT_LM_ALPHA,
            beta: DEFAULT_LM_BETA,
        }
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Everything needed to construct a speech engine.
///
/// ```
/// use live_stt::engine::{EngineConfig, DEFAULT_BEAM_WIDTH};
///
/// let config = EngineConfig::new("model.bin", "alphabet.txt")
///     .with_language_model("lm.binary", "trie");
/// assert_eq!(config.beam_width, DEFAULT_BEAM_WIDTH);
/// assert!(config.language_model.is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub model_path: PathBuf,
    pub alphabet_path: PathBuf,
    pub n_features: u32,
    pub n_context: u32,
    pub beam_width: u32,
    /// ISO-639-1 code handed to backends that need one.
    pub language: String,
    pub language_model: Option<LanguageModelConfig>,
}

impl EngineConfig {
    pub fn new(model_path: impl Into<PathBuf>, alphabet_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            alphabet_path: alphabet_path.into(),
            n_features: DEFAULT_N_FEATURES,
            n_context: DEFAULT_N_CONTEXT,
            beam_width: DEFAULT_BEAM_WIDTH,
            language: "en".into(),
            language_model: None,
        }
    }

    /// Enable language-model-assisted decoding with default weights.
    pub fn with_language_model(
        mut self,
        binary_path: impl Into<PathBuf>,
        trie_path: impl Into<PathBuf>,
    ) -> Self {
        self.language_model = Some(LanguageModelConfig::new(binary_path, trie_path));
        self
    }

    /// Check parameter ranges and that every referenced file can be opened.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidParameter`] for a zero feature count, context
    ///   window or beam width.
    /// - [`EngineError::MissingFile`] for the first file that cannot be read.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.n_features == 0 {
            return Err(EngineError::InvalidParameter("feature count must be > 0".into()));
        }
        if self.n_context == 0 {
            return Err(EngineError::InvalidParameter("context window must be > 0".into()));
        }
        if self.beam_width == 0 {
            return Err(EngineError::InvalidParameter("beam width must be > 0".into()));
        }

        check_readable("model", &self.model_path)?;
        check_readable("alphabet", &self.alphabet_path)?;
        if let Some(lm) = &self.language_model {
            check_readable("language model", &lm.binary_path)?;
            check_readable("trie", &lm.trie_path)?;
        }
        Ok(())
    }
}

fn check_readable(kind: &'static str, path: &Path) -> Result<(), EngineError> {
    let missing = |reason: String| EngineError::MissingFile {
        kind,
        path: path.display().to_string(),
        reason,
    };

    if path.is_dir() {
        return Err(missing("is a directory".into()));
    }
    File::open(path).map(|_| ()).map_err(|e| missing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"x").expect("write fixture");
        path
    }

    #[test]
    fn defaults_match_reference_tuning() {
        let cfg = EngineConfig::new("m", "a");
        assert_eq!(cfg.n_features, 26);
        assert_eq!(cfg.n_context, 9);
        assert_eq!(cfg.beam_width, 500);
        assert!(cfg.language_model.is_none());

        let lm = LanguageModelConfig::new("lm.binary", "trie");
        assert!((lm.alpha - 0.75).abs() < f32::EPSILON);
        assert!((lm.beta - 1.85).abs() < f32::EPSILON);
    }

    #[test]
    fn validate_accepts_readable_files() {
        let dir = tempdir().expect("temp dir");
        let cfg = EngineConfig::new(touch(dir.path(), "model.bin"), touch(dir.path(), "alphabet.txt"))
            .with_language_model(touch(dir.path(), "lm.binary"), touch(dir.path(), "trie"));
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn validate_reports_missing_model_first() {
        let dir = tempdir().expect("temp dir");
        let cfg = EngineConfig::new(dir.path().join("absent.bin"), dir.path().join("absent.txt"));
        match cfg.validate() {
            Err(EngineError::MissingFile { kind, path, .. }) => {
                assert_eq!(kind, "model");
                assert!(path.ends_with("absent.bin"));
            }
            other => panic!("expected MissingFile, got {other:?}"),
        }
    }

    #[test]
    fn validate_checks_trie_when_language_model_enabled() {
        let dir = tempdir().expect("temp dir");
        let cfg = EngineConfig::new(touch(dir.path(), "model.bin"), touch(dir.path(), "alphabet.txt"))
            .with_language_model(touch(dir.path(), "lm.binary"), dir.path().join("no-trie"));
        assert!(matches!(
            cfg.validate(),
            Err(EngineError::MissingFile { kind: "trie", .. })
        ));
    }

    #[test]
    fn validate_rejects_directory_as_model() {
        let dir = tempdir().expect("temp dir");
        let cfg = EngineConfig::new(dir.path(), touch(dir.path(), "alphabet.txt"));
        assert!(matches!(
            cfg.validate(),
            Err(EngineError::MissingFile { kind: "model", .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_beam_width() {
        let mut cfg = EngineConfig::new("m", "a");
        cfg.beam_width = 0;
        assert!(matches!(cfg.validate(), Err(EngineError::InvalidParameter(_))));
    }
}
