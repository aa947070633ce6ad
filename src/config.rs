use std::time::Duration;

use crate::error::{AppError, Result};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
pub const DEFAULT_PAGESPEED_ENDPOINT: &str =
    "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_PERSONA: &str = "You are an expert SEO consultant. Your tone is professional, encouraging, and data-driven.";

/// Engine configuration loaded from environment variables.
///
/// Every external call has its own bound; a missing API key disables the
/// matching provider and the engine runs on its fallbacks.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // Page source
    pub user_agent: String,
    pub fetch_timeout: Duration,

    // Performance telemetry
    pub pagespeed_enabled: bool,
    pub pagespeed_endpoint: String,
    pub pagespeed_api_key: Option<String>,
    pub telemetry_timeout: Duration,
    pub probe_timeout: Duration,

    // Generative text
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_endpoint: String,
    pub generative_timeout: Duration,
    pub persona: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout: Duration::from_secs(30),
            pagespeed_enabled: true,
            pagespeed_endpoint: DEFAULT_PAGESPEED_ENDPOINT.to_string(),
            pagespeed_api_key: None,
            telemetry_timeout: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(10),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            generative_timeout: Duration::from_secs(30),
            persona: DEFAULT_PERSONA.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let secs = |key: &str, fallback: Duration| -> Result<Duration> {
            match non_empty(key) {
                Some(raw) => raw
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| AppError::Config(format!("{key} must be a whole number of seconds, got {raw:?}"))),
                None => Ok(fallback),
            }
        };

        let disabled = match non_empty("SITE_ANALYZER_DISABLE_PAGESPEED") {
            Some(raw) => raw
                .parse::<bool>()
                .map_err(|_| AppError::Config(format!("SITE_ANALYZER_DISABLE_PAGESPEED must be true or false, got {raw:?}")))?,
            None => false,
        };

        let config = Self {
            user_agent: non_empty("SITE_ANALYZER_USER_AGENT").unwrap_or(defaults.user_agent),
            fetch_timeout: secs("SITE_ANALYZER_FETCH_TIMEOUT_SECS", defaults.fetch_timeout)?,
            pagespeed_enabled: !disabled,
            pagespeed_endpoint: non_empty("PAGESPEED_ENDPOINT").unwrap_or(defaults.pagespeed_endpoint),
            pagespeed_api_key: non_empty("PAGESPEED_API_KEY"),
            telemetry_timeout: secs("SITE_ANALYZER_TELEMETRY_TIMEOUT_SECS", defaults.telemetry_timeout)?,
            probe_timeout: secs("SITE_ANALYZER_PROBE_TIMEOUT_SECS", defaults.probe_timeout)?,
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_model: non_empty("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_endpoint: non_empty("GEMINI_ENDPOINT").unwrap_or(defaults.gemini_endpoint),
            generative_timeout: secs("SITE_ANALYZER_GENERATIVE_TIMEOUT_SECS", defaults.generative_timeout)?,
            persona: non_empty("SITE_ANALYZER_PERSONA").unwrap_or(defaults.persona),
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        fn preview(val: &Option<String>) -> String {
            match val {
                Some(v) => {
                    let n = v.chars().count().min(5);
                    format!("{}...", v.chars().take(n).collect::<String>())
                }
                None => "(unset)".to_string(),
            }
        }
        tracing::info!(
            "[CONFIG] pagespeed enabled={} key={} | gemini model={} key={}",
            self.pagespeed_enabled,
            preview(&self.pagespeed_api_key),
            self.gemini_model,
            preview(&self.gemini_api_key),
        );
    }
}
