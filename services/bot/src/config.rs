use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
///
/// The three credentials are mandatory; everything else has a default.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_token: String,
    pub openai_api_key: String,
    pub geosuggest_api_key: String,
    pub geosuggest_base_url: String,
    pub suggest_lang: String,
    pub chat_model: String,
    pub voice_replies: bool,
    pub voice: String,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let telegram_token = require("TELEGRAM_BOT_TOKEN")?;
        let openai_api_key = require("OPENAI_API_KEY")?;
        let geosuggest_api_key = require("GEOSUGGEST_API_KEY")?;

        let geosuggest_base_url = std::env::var("GEOSUGGEST_BASE_URL")
            .unwrap_or_else(|_| "https://suggest-maps.yandex.ru/v1/suggest".to_string());
        let suggest_lang = std::env::var("SUGGEST_LANG").unwrap_or_else(|_| "en".to_string());
        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let voice_replies = match std::env::var("VOICE_REPLIES") {
            Ok(raw) => raw.parse::<bool>().map_err(|_| {
                ConfigError::InvalidValue(
                    "VOICE_REPLIES".to_string(),
                    format!("'{}' is not a boolean", raw),
                )
            })?,
            Err(_) => false,
        };
        let voice = std::env::var("VOICE").unwrap_or_else(|_| "alloy".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            telegram_token,
            openai_api_key,
            geosuggest_api_key,
            geosuggest_base_url,
            suggest_lang,
            chat_model,
            voice_replies,
            voice,
            log_level,
        })
    }
}

fn require(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}
