//! Command-line flags.  Every flag overrides the matching `settings.toml`
//! value; anything not given on the command line keeps the file's value.

use std::path::PathBuf;

use clap::Parser;

use crate::config::AppConfig;
use crate::worker::ShutdownPolicy;

#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about = "Live microphone speech-to-text", long_about = None)]
pub struct Cli {
    /// Acoustic model file
    #[arg(long, env = "LIVE_STT_MODEL")]
    pub model: Option<PathBuf>,

    /// Alphabet file (one output symbol per line)
    #[arg(long, env = "LIVE_STT_ALPHABET")]
    pub alphabet: Option<PathBuf>,

    /// Language-model binary; requires --trie
    #[arg(long, env = "LIVE_STT_LM")]
    pub lm: Option<PathBuf>,

    /// Language-model trie; requires --lm
    #[arg(long, env = "LIVE_STT_TRIE")]
    pub trie: Option<PathBuf>,

    /// Settings file to load instead of the platform default
    #[arg(long, env = "LIVE_STT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Decoder beam width
    #[arg(long)]
    pub beam_width: Option<u32>,

    /// What to do with queued audio on exit: drain | immediate
    #[arg(long)]
    pub shutdown_policy: Option<ShutdownPolicy>,
}

impl Cli {
    /// Load the settings file named by `--config`, or the platform default.
    pub fn load_config(&self) -> anyhow::Result<AppConfig> {
        match &self.config {
            Some(path) => AppConfig::load_from(path),
            None => AppConfig::load(),
        }
    }

    /// Overlay the flags that were given onto `config`.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(model) = &self.model {
            config.engine.model = Some(model.clone());
        }
        if let Some(alphabet) = &self.alphabet {
            config.engine.alphabet = Some(alphabet.clone());
        }
        if let Some(lm) = &self.lm {
            config.engine.lm = Some(lm.clone());
        }
        if let Some(trie) = &self.trie {
            config.engine.trie = Some(trie.clone());
        }
        if let Some(beam_width) = self.beam_width {
            config.engine.beam_width = beam_width;
        }
        if let Some(policy) = self.shutdown_policy {
            config.worker.shutdown_policy = policy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn flags_override_file_values() {
        let cli = Cli::try_parse_from([
            "live-stt",
            "--model",
            "/m/model.bin",
            "--alphabet",
            "/m/alphabet.txt",
            "--beam-width",
            "64",
            "--shutdown-policy",
            "immediate",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        config.engine.lm = Some("kept.binary".into());
        cli.apply_to(&mut config);

        assert_eq!(config.engine.model, Some(PathBuf::from("/m/model.bin")));
        assert_eq!(config.engine.alphabet, Some(PathBuf::from("/m/alphabet.txt")));
        assert_eq!(config.engine.lm, Some(PathBuf::from("kept.binary")));
        assert_eq!(config.engine.beam_width, 64);
        assert_eq!(config.worker.shutdown_policy, ShutdownPolicy::Immediate);
    }

    #[test]
    fn no_flags_leave_config_untouched() {
        let cli = Cli::default();
        let mut config = AppConfig::default();
        cli.apply_to(&mut config);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let result = Cli::try_parse_from(["live-stt", "--shutdown-policy", "eventually"]);
        assert!(result.is_err());
    }

    #[test]
    fn explicit_config_path_is_loaded() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[engine]\nbeam_width = 7\n").unwrap();

        let cli = Cli {
            config: Some(path),
            ..Cli::default()
        };
        assert_eq!(cli.load_config().unwrap().engine.beam_width, 7);
    }
}
