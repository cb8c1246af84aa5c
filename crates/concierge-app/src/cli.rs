//! CLI argument definitions for the concierge terminal client.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use concierge_core::config::ConciergeConfig;
use concierge_core::Language;

/// VWAT concierge - scripted bilingual help desk in the terminal.
#[derive(Parser, Debug)]
#[command(name = "concierge", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Conversation language (vi, en).
    #[arg(short = 'L', long = "language")]
    pub language: Option<String>,

    /// Directory holding session.json.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Directory with strings, programs and events files.
    #[arg(long = "content-dir")]
    pub content_dir: Option<PathBuf>,

    /// Base URL serving the content files.
    #[arg(long = "content-url")]
    pub content_url: Option<String>,

    /// Base URL of the chat and interaction-logging backend.
    #[arg(short = 'b', long = "backend-url")]
    pub backend_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Skip all conversational pauses.
    #[arg(long = "instant")]
    pub instant: bool,

    /// Print render events as JSON lines instead of text.
    #[arg(long = "json")]
    pub json: bool,
}

impl CliArgs {
    /// Priority: --config flag > CONCIERGE_CONFIG env var > ~/.concierge/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CONCIERGE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// An explicitly requested language, if any.
    ///
    /// Priority: --language flag > CONCIERGE_LANG env var. Unknown codes are
    /// reported and ignored.
    pub fn resolve_language(&self) -> Option<Language> {
        let raw = self
            .language
            .clone()
            .or_else(|| std::env::var("CONCIERGE_LANG").ok())?;
        match raw.parse() {
            Ok(language) => Some(language),
            Err(e) => {
                tracing::warn!(value = %raw, error = %e, "Ignoring requested language");
                None
            }
        }
    }

    /// Priority: --backend-url flag > CONCIERGE_BACKEND_URL env var > config file value.
    pub fn resolve_backend_url(&self, config_url: Option<&str>) -> Option<String> {
        if let Some(ref url) = self.backend_url {
            return Some(url.clone());
        }
        if let Ok(url) = std::env::var("CONCIERGE_BACKEND_URL") {
            if !url.trim().is_empty() {
                return Some(url);
            }
        }
        config_url.map(str::to_string)
    }

    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Fold the path and URL overrides into a loaded configuration.
    pub fn apply(&self, config: &mut ConciergeConfig) {
        if let Some(ref dir) = self.data_dir {
            config.general.data_dir = dir.to_string_lossy().to_string();
        }
        if let Some(ref dir) = self.content_dir {
            config.content.content_dir = Some(dir.to_string_lossy().to_string());
        }
        if let Some(ref url) = self.content_url {
            config.content.content_url = Some(url.clone());
        }
        config.backend.base_url = self.resolve_backend_url(config.backend.base_url.as_deref());
        config.general.log_level = self.resolve_log_level(&config.general.log_level);
        if self.instant {
            config.timing = concierge_core::config::TimingConfig::instant();
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".concierge").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::parse_from([
            "concierge",
            "--language",
            "en",
            "--content-dir",
            "data",
            "--instant",
            "--json",
        ]);
        assert_eq!(args.language.as_deref(), Some("en"));
        assert_eq!(args.resolve_language(), Some(Language::En));
        assert!(args.instant);
        assert!(args.json);
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let args = CliArgs::parse_from(["concierge", "-c", "/tmp/concierge.toml"]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/concierge.toml"));
    }

    #[test]
    fn test_unknown_language_is_ignored() {
        let args = CliArgs::parse_from(["concierge", "--language", "fr"]);
        assert_eq!(args.resolve_language(), None);
    }

    #[test]
    fn test_apply_overrides() {
        let args = CliArgs::parse_from([
            "concierge",
            "--data-dir",
            "/var/lib/concierge",
            "--content-url",
            "https://cdn.example.org/content",
            "--backend-url",
            "http://localhost:5000",
            "--log-level",
            "debug",
            "--instant",
        ]);
        let mut config = ConciergeConfig::default();
        args.apply(&mut config);

        assert_eq!(config.general.data_dir, "/var/lib/concierge");
        assert_eq!(
            config.content.content_url.as_deref(),
            Some("https://cdn.example.org/content")
        );
        assert_eq!(config.backend.base_url.as_deref(), Some("http://localhost:5000"));
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.timing.settle_ms, 0);
    }

    #[test]
    fn test_apply_keeps_config_values_without_flags() {
        let args = CliArgs::parse_from(["concierge", "--backend-url", "http://b"]);
        let mut config = ConciergeConfig::default();
        config.general.log_level = "warn".to_string();
        args.apply(&mut config);

        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.timing.settle_ms, 2000);
        assert!(config.content.content_dir.is_none());
    }
}
