use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConciergeError, Result};
use crate::types::Language;

/// Top-level configuration for the Concierge application.
///
/// Loaded from `~/.concierge/config.toml` by default. Each section maps to
/// one collaborator of the dialogue engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConciergeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

impl ConciergeConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ConciergeConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ConciergeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Data directory with a leading `~` expanded against `$HOME`.
    pub fn data_dir(&self) -> PathBuf {
        expand_home(&self.general.data_dir)
    }
}

/// Expand a leading `~/` using the `HOME` environment variable.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding `session.json`.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Language used when no preference has been persisted yet.
    pub default_language: Language,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.concierge/data".to_string(),
            log_level: "info".to_string(),
            default_language: Language::Vi,
        }
    }
}

/// Where localized strings, programs and events come from.
///
/// When neither is set the built-in string tables are used and the program
/// and event sets are empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Local directory with `strings.<lang>.json`, `programs.<lang>.json`, `events.json`.
    pub content_dir: Option<String>,
    /// Base URL serving the same file names. Takes precedence over `content_dir`.
    pub content_url: Option<String>,
}

/// Remote generation and interaction-logging backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL exposing `/chat` and `/log_interaction`. `None` disables both.
    pub base_url: Option<String>,
    pub request_timeout_secs: u64,
    /// Report (selection, response) pairs to `/log_interaction`.
    pub logging_enabled: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: 30,
            logging_enabled: true,
        }
    }
}

/// Conversation pacing, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay before the welcome greeting.
    pub welcome_greeting_ms: u64,
    /// Delay between the greeting and the root menu.
    pub welcome_menu_ms: u64,
    /// Pause after an option is clicked, before its content appears.
    pub settle_ms: u64,
    /// Typing indicator time for free text that matched a branch.
    pub typing_ms: u64,
    /// Pause after a quick reply before the menu or goodbye.
    pub quick_reply_ms: u64,
    /// Pause between a leaf response and the "anything else?" prompt.
    pub follow_up_ms: u64,
    /// One reveal token is released per tick.
    pub reveal_tick_ms: u64,
    /// Added to the reveal duration before the follow-up of a remote reply.
    pub reveal_buffer_ms: u64,
    /// Wait before the single retry when programs are still loading.
    pub programs_retry_ms: u64,
    /// Pause before offering options after "no new programs".
    pub no_programs_follow_up_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            welcome_greeting_ms: 500,
            welcome_menu_ms: 2000,
            settle_ms: 2000,
            typing_ms: 1000,
            quick_reply_ms: 800,
            follow_up_ms: 500,
            reveal_tick_ms: 50,
            reveal_buffer_ms: 500,
            programs_retry_ms: 1000,
            no_programs_follow_up_ms: 500,
        }
    }
}

impl TimingConfig {
    pub fn welcome_greeting(&self) -> Duration {
        Duration::from_millis(self.welcome_greeting_ms)
    }

    pub fn welcome_menu(&self) -> Duration {
        Duration::from_millis(self.welcome_menu_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn typing(&self) -> Duration {
        Duration::from_millis(self.typing_ms)
    }

    pub fn quick_reply(&self) -> Duration {
        Duration::from_millis(self.quick_reply_ms)
    }

    pub fn follow_up(&self) -> Duration {
        Duration::from_millis(self.follow_up_ms)
    }

    pub fn reveal_tick(&self) -> Duration {
        Duration::from_millis(self.reveal_tick_ms)
    }

    pub fn programs_retry(&self) -> Duration {
        Duration::from_millis(self.programs_retry_ms)
    }

    pub fn no_programs_follow_up(&self) -> Duration {
        Duration::from_millis(self.no_programs_follow_up_ms)
    }

    /// Time for a revealed reply of `tokens` tokens to finish, plus the buffer.
    pub fn reveal_follow_up(&self, tokens: usize) -> Duration {
        let reveal = self.reveal_tick_ms.saturating_mul(tokens as u64);
        Duration::from_millis(reveal.saturating_add(self.reveal_buffer_ms))
    }

    /// All delays set to zero. Handy for front-ends that pace output themselves.
    pub fn instant() -> Self {
        Self {
            welcome_greeting_ms: 0,
            welcome_menu_ms: 0,
            settle_ms: 0,
            typing_ms: 0,
            quick_reply_ms: 0,
            follow_up_ms: 0,
            reveal_tick_ms: 0,
            reveal_buffer_ms: 0,
            programs_retry_ms: 0,
            no_programs_follow_up_ms: 0,
        }
    }
}
