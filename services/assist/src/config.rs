//! Application Configuration Module
//!
//! Loads settings from environment variables (and a `.env` file when present)
//! into a single struct that is passed to the rest of the service.

use secrecy::SecretString;
use std::env;
use tracing::Level;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MATHPIX_URL: &str = "https://api.mathpix.com/v3/text";

/// Where responses come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseProvider {
    Gemini,
    /// Canned answers, for running without network access.
    Offline,
}

/// Holds all configuration loaded from the environment.
#[derive(Debug)]
pub struct Config {
    pub provider: ResponseProvider,
    pub gemini_api_key: Option<SecretString>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub speech_rate: f32,
    pub log_level: Level,
    /// OCR credentials as `(app_id, app_key)`. Without them only plain text can be attached.
    pub mathpix: Option<(SecretString, SecretString)>,
    pub mathpix_url: String,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// *   `RESPONSE_PROVIDER`: "gemini" or "offline". Defaults to "gemini".
    /// *   `GEMINI_API_KEY`: Required if provider is "gemini".
    /// *   `GEMINI_MODEL`: (Optional) Defaults to "gemini-2.5-flash".
    /// *   `GEMINI_BASE_URL`: (Optional) Defaults to the public v1beta endpoint.
    /// *   `SPEECH_RATE`: (Optional) Initial playback rate. Defaults to 1.0.
    /// *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    /// *   `MATHPIX_APP_ID` / `MATHPIX_APP_KEY`: (Optional) OCR credentials, both or neither.
    /// *   `MATHPIX_URL`: (Optional) Defaults to the public `v3/text` endpoint.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Useful for local development, ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let provider_str = lookup("RESPONSE_PROVIDER").unwrap_or_else(|| "gemini".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "gemini" => ResponseProvider::Gemini,
            "offline" => ResponseProvider::Offline,
            other => {
                return Err(ConfigError::InvalidValue(
                    "RESPONSE_PROVIDER".to_string(),
                    format!("'{}' is not one of gemini, offline", other),
                ));
            }
        };

        let gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);
        let gemini_model =
            lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let gemini_base_url =
            lookup("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());

        let speech_rate_str = lookup("SPEECH_RATE").unwrap_or_else(|| "1.0".to_string());
        let speech_rate = speech_rate_str
            .parse::<f32>()
            .map_err(|e| ConfigError::InvalidValue("SPEECH_RATE".to_string(), e.to_string()))?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // Validate that the required API key is present for the selected provider.
        if provider == ResponseProvider::Gemini && gemini_api_key.is_none() {
            return Err(ConfigError::MissingVar(
                "GEMINI_API_KEY must be set for 'gemini' provider".to_string(),
            ));
        }

        let secret = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(SecretString::from)
        };
        let mathpix = match (secret("MATHPIX_APP_ID"), secret("MATHPIX_APP_KEY")) {
            (Some(id), Some(key)) => Some((id, key)),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingVar("MATHPIX_APP_KEY".to_string())),
            (None, Some(_)) => return Err(ConfigError::MissingVar("MATHPIX_APP_ID".to_string())),
        };
        let mathpix_url = lookup("MATHPIX_URL").unwrap_or_else(|| DEFAULT_MATHPIX_URL.to_string());

        Ok(Self {
            provider,
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            speech_rate,
            log_level,
            mathpix,
            mathpix_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_gemini_defaults() {
        let config = load(&[("GEMINI_API_KEY", "secret")]).unwrap();
        assert_eq!(config.provider, ResponseProvider::Gemini);
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.gemini_base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.speech_rate, 1.0);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.gemini_api_key.unwrap().expose_secret(), "secret");
        assert!(config.mathpix.is_none());
        assert_eq!(config.mathpix_url, DEFAULT_MATHPIX_URL);
    }

    #[test]
    fn test_mathpix_credentials_come_in_pairs() {
        let config = load(&[
            ("RESPONSE_PROVIDER", "offline"),
            ("MATHPIX_APP_ID", "app"),
            ("MATHPIX_APP_KEY", "key"),
        ])
        .unwrap();
        let (id, key) = config.mathpix.unwrap();
        assert_eq!(id.expose_secret(), "app");
        assert_eq!(key.expose_secret(), "key");

        assert!(matches!(
            load(&[("RESPONSE_PROVIDER", "offline"), ("MATHPIX_APP_ID", "app")]),
            Err(ConfigError::MissingVar(var)) if var == "MATHPIX_APP_KEY"
        ));
    }

    #[test]
    fn test_gemini_requires_a_key() {
        let result = load(&[("GEMINI_API_KEY", "  ")]);
        assert!(matches!(result, Err(ConfigError::MissingVar(_))));
    }

    #[test]
    fn test_offline_needs_no_key() {
        let config = load(&[
            ("RESPONSE_PROVIDER", "Offline"),
            ("SPEECH_RATE", "1.3"),
            ("RUST_LOG", "debug"),
        ])
        .unwrap();
        assert_eq!(config.provider, ResponseProvider::Offline);
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.speech_rate, 1.3);
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            load(&[("RESPONSE_PROVIDER", "openai")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "RESPONSE_PROVIDER"
        ));
        assert!(matches!(
            load(&[("RESPONSE_PROVIDER", "offline"), ("SPEECH_RATE", "fast")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "SPEECH_RATE"
        ));
        assert!(matches!(
            load(&[("RESPONSE_PROVIDER", "offline"), ("RUST_LOG", "loud")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "RUST_LOG"
        ));
    }
}
