//! Client configuration.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Supabase project URL baked in at compile time via `SUPABASE_URL`.
pub const DEFAULT_SUPABASE_URL: &str = match option_env!("SUPABASE_URL") {
    Some(url) => url,
    None => "https://coupons.supabase.co",
};

/// Supabase publishable key baked in at compile time via `SUPABASE_PUBLISHABLE_KEY`.
pub const DEFAULT_SUPABASE_PUBLISHABLE_KEY: &str = match option_env!("SUPABASE_PUBLISHABLE_KEY")
{
    Some(key) => key,
    None => "public-anon-key",
};

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Edge function that applies favourite counter deltas.
pub const DEFAULT_COUNTER_FUNCTION: &str = "favourite-counter";

/// Minimum time a favourite toggle stays pending, so feedback is perceptible.
pub const DEFAULT_MIN_FEEDBACK_DELAY_MS: u64 = 200;

pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 100;

const ENV_LOG_LEVEL: &str = "COUPON_CLIENT_LOG_LEVEL";
const ENV_MIN_FEEDBACK_MS: &str = "COUPON_CLIENT_MIN_FEEDBACK_MS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// trace, debug, info, warn or error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_supabase_url")]
    pub supabase_url: String,
    #[serde(default = "default_supabase_publishable_key")]
    pub supabase_publishable_key: String,
    #[serde(default = "default_counter_function")]
    pub counter_function: String,
    #[serde(default = "default_min_feedback_delay_ms")]
    pub min_feedback_delay_ms: u64,
    /// Buffer size of the client event broadcast channel.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_supabase_url() -> String {
    DEFAULT_SUPABASE_URL.to_string()
}

fn default_supabase_publishable_key() -> String {
    DEFAULT_SUPABASE_PUBLISHABLE_KEY.to_string()
}

fn default_counter_function() -> String {
    DEFAULT_COUNTER_FUNCTION.to_string()
}

fn default_min_feedback_delay_ms() -> u64 {
    DEFAULT_MIN_FEEDBACK_DELAY_MS
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            supabase_url: default_supabase_url(),
            supabase_publishable_key: default_supabase_publishable_key(),
            counter_function: default_counter_function(),
            min_feedback_delay_ms: DEFAULT_MIN_FEEDBACK_DELAY_MS,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl Config {
    /// Defaults with environment overrides applied.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok());
        config
    }

    /// Load `<base>/config.json` if present, then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Only the log level and the feedback delay can be overridden at runtime.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            self.log_level = level.trim().to_string();
        }
        if let Some(delay) = lookup(ENV_MIN_FEEDBACK_MS).and_then(|v| v.trim().parse().ok()) {
            self.min_feedback_delay_ms = delay;
        }
    }

    fn validate(&self) -> CoreResult<()> {
        self.supabase_url()?;
        if self.counter_function.trim().is_empty() {
            return Err(CoreError::Config(
                "counter_function must not be empty".to_string(),
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(CoreError::Config(
                "event_channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn supabase_url(&self) -> CoreResult<Url> {
        Url::parse(&self.supabase_url).map_err(CoreError::from)
    }

    pub fn min_feedback_delay(&self) -> Duration {
        Duration::from_millis(self.min_feedback_delay_ms)
    }
}
