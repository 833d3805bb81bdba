//! Environment configuration for the daemon.

use std::env;
use std::fs;
use std::time::Duration;

use log::warn;
use retroline::BridgeConfig;

/// Built-in system prompt used when no override is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Keep responses concise and under 200 characters when possible.";

/// Fully resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeEnvConfig {
    pub serial_port: String,
    pub baud_rate: u32,
    pub idle_timeout: Duration,
    pub auto_message: bool,
    pub word_delay: Duration,
    pub responder_id: String,
    pub system_prompt: String,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Option<String>,
}

impl BridgeEnvConfig {
    /// Reads every `BRIDGE_*`/`LLM_*` variable, applying defaults for unset
    /// values and rejecting unparseable numeric overrides.
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            serial_port: env_string_opt("BRIDGE_SERIAL_PORT")
                .unwrap_or_else(|| "/dev/ttyUSB0".to_string()),
            baud_rate: env_u32("BRIDGE_BAUD_RATE", 2400)?,
            idle_timeout: Duration::from_secs(u64::from(env_u32(
                "BRIDGE_IDLE_TIMEOUT_SEC",
                120,
            )?)),
            auto_message: !env_flag_disabled("BRIDGE_AUTO_MESSAGE"),
            word_delay: Duration::from_millis(u64::from(env_u32("BRIDGE_WORD_DELAY_MS", 200)?)),
            responder_id: env_string_opt("BRIDGE_RESPONDER")
                .unwrap_or_else(|| crate::responders::DEFAULT_RESPONDER_ID.to_string()),
            system_prompt: system_prompt_from_env(),
            api_key: env_string_opt("LLM_API_KEY"),
            model: env_string_opt("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            base_url: env_string_opt("LLM_BASE_URL"),
        })
    }

    /// Core-loop configuration derived from the resolved values.
    #[must_use]
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig::new()
            .with_idle_timeout(self.idle_timeout)
            .with_auto_message(self.auto_message)
            .with_word_delay(self.word_delay)
    }
}

/// Resolves the system prompt: prompt file, inline variable, then default.
pub fn system_prompt_from_env() -> String {
    if let Some(path) = env_string_opt("BRIDGE_SYSTEM_PROMPT_FILE") {
        match fs::read_to_string(&path) {
            Ok(contents) if !contents.trim().is_empty() => return contents.trim().to_string(),
            Ok(_) => warn!("system prompt file {path} is empty, falling back"),
            Err(error) => warn!("cannot read system prompt file {path}: {error}"),
        }
    }

    env_string_opt("BRIDGE_SYSTEM_PROMPT").unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_u32(key: &str, default: u32) -> Result<u32, String> {
    match env_string_opt(key) {
        None => Ok(default),
        Some(value) => value
            .parse::<u32>()
            .map_err(|_| format!("{key} must be a non-negative integer, got '{value}'")),
    }
}

fn env_flag_disabled(key: &str) -> bool {
    env::var(key).map(|value| value.trim() == "0").unwrap_or(false)
}
