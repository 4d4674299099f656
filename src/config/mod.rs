//! Configuration (layered: code > env > TOML file).

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PilotError;
use crate::types::GenerationSettings;

pub const DEFAULT_MODEL: &str = "mistral-medium-2505";
pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";
pub const DEFAULT_MAX_TURNS: u32 = 10;
pub const DEFAULT_TOOL_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_CLEANUP_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_FRAME_CAPACITY: usize = 64;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant with access to a computer. \
Use the computer tool to help the user with their requests. \
Use the bash tool to execute commands on the computer. You can create files and folders using the bash tool. \
Always prefer the bash tool where it is viable for the task. \
Be sure to advise the user when waiting is necessary. \
If the browser opens with a setup wizard, YOU MUST IGNORE IT and move straight to the next step \
(e.g. input the url in the search bar).";

/// Settings for one orchestrator instance.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PilotConfig {
    /// Mistral API key. Never printed by `Debug`.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Prepended as a system message. `None` sends the history alone.
    pub system_prompt: Option<String>,
    /// Model turns per exchange, counting the first.
    pub max_turns: u32,
    /// Per tool call, in milliseconds.
    pub tool_timeout_ms: u64,
    /// Session kill on failure, in milliseconds.
    pub cleanup_timeout_ms: u64,
    /// Outbound frames buffered before the exchange waits for the client.
    pub frame_capacity: usize,
    pub generation: GenerationSettings,
}

impl fmt::Debug for PilotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PilotConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("max_turns", &self.max_turns)
            .field("tool_timeout_ms", &self.tool_timeout_ms)
            .field("cleanup_timeout_ms", &self.cleanup_timeout_ms)
            .field("frame_capacity", &self.frame_capacity)
            .field("generation", &self.generation)
            .finish()
    }
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            max_turns: DEFAULT_MAX_TURNS,
            tool_timeout_ms: DEFAULT_TOOL_TIMEOUT_MS,
            cleanup_timeout_ms: DEFAULT_CLEANUP_TIMEOUT_MS,
            frame_capacity: DEFAULT_FRAME_CAPACITY,
            generation: GenerationSettings::default(),
        }
    }
}

impl PilotConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from environment variables, reading `.env` first if present.
    pub fn from_env() -> Result<Self, PilotError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    /// Parse a TOML document. Unset keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, PilotError> {
        let config: Self = toml::from_str(source)
            .map_err(|e| PilotError::Configuration(format!("invalid config: {e}")))?;
        config.validate()
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PilotError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            PilotError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// Overlay environment values on top of `self`.
    pub fn apply_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, PilotError> {
        if let Some(key) = lookup("MISTRAL_API_KEY").filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup("MISTRAL_BASE_URL") {
            self.base_url = url;
        }
        if let Some(model) = lookup("DESKTOP_PILOT_MODEL") {
            self.model = model;
        }
        if let Some(turns) = lookup("DESKTOP_PILOT_MAX_TURNS") {
            self.max_turns = turns.trim().parse().map_err(|_| {
                PilotError::Configuration(format!(
                    "DESKTOP_PILOT_MAX_TURNS must be a positive integer, got '{turns}'"
                ))
            })?;
        }
        self.validate()
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    pub fn with_max_turns(mut self, turns: u32) -> Self {
        self.max_turns = turns;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout_ms = duration_ms(timeout);
        self
    }

    pub fn with_cleanup_timeout(mut self, timeout: Duration) -> Self {
        self.cleanup_timeout_ms = duration_ms(timeout);
        self
    }

    pub fn with_generation(mut self, settings: GenerationSettings) -> Self {
        self.generation = settings;
        self
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_millis(self.tool_timeout_ms)
    }

    pub fn cleanup_timeout(&self) -> Duration {
        Duration::from_millis(self.cleanup_timeout_ms)
    }

    /// Resolve the API key or fail with an authentication error.
    pub fn require_api_key(&self) -> Result<&str, PilotError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| PilotError::Authentication("Missing MISTRAL_API_KEY".into()))
    }

    /// Reject settings that cannot drive an exchange.
    pub fn validate(self) -> Result<Self, PilotError> {
        if self.max_turns == 0 {
            return Err(PilotError::Configuration("max_turns must be at least 1".into()));
        }
        if self.tool_timeout_ms == 0 {
            return Err(PilotError::Configuration(
                "tool_timeout_ms must be at least 1".into(),
            ));
        }
        if self.cleanup_timeout_ms == 0 {
            return Err(PilotError::Configuration(
                "cleanup_timeout_ms must be at least 1".into(),
            ));
        }
        if self.frame_capacity == 0 {
            return Err(PilotError::Configuration(
                "frame_capacity must be at least 1".into(),
            ));
        }
        Ok(self)
    }
}

/// Whole milliseconds, saturating.
fn duration_ms(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}
