use crate::error::ConfigError;
use crate::models::{IngestionOptions, ModelParameters};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const API_KEY_ENV: &str = "OPEN_API_KEY";
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_PDF_PATH: &str = "simple-sab.pdf";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_TOP_K: usize = 2;
pub const DEFAULT_HISTORY_CHAR_LIMIT: usize = 1_000;

/// Bearer token for the remote API. The value never shows up in `Debug` output.
#[derive(Clone)]
pub struct ApiCredential(String);

impl ApiCredential {
    /// Accepts an already-resolved value (for example from a CLI flag backed by
    /// an env var). Blank values count as missing.
    pub fn new(raw: Option<String>) -> Result<Self, ConfigError> {
        raw.map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(Self)
            .ok_or_else(|| ConfigError::MissingCredential(API_KEY_ENV.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiCredential(***)")
    }
}

#[derive(Debug, Clone)]
pub struct ApiEndpoint {
    pub base_url: Url,
    pub credential: ApiCredential,
    pub request_timeout: Option<Duration>,
}

impl ApiEndpoint {
    pub fn new(
        base_url: &str,
        credential: ApiCredential,
        request_timeout: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            credential,
            request_timeout,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub pdf_path: PathBuf,
    pub parameters: ModelParameters,
    pub embedding_model: String,
    pub top_k: usize,
    pub ingestion: IngestionOptions,
    pub history_char_limit: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            pdf_path: PathBuf::from(DEFAULT_PDF_PATH),
            parameters: ModelParameters::default(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            top_k: DEFAULT_TOP_K,
            ingestion: IngestionOptions::default(),
            history_char_limit: DEFAULT_HISTORY_CHAR_LIMIT,
        }
    }
}

impl ChatSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let temperature = self.parameters.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidTemperature(temperature));
        }
        if self.top_k == 0 {
            return Err(ConfigError::InvalidTopK);
        }
        if self.history_char_limit == 0 {
            return Err(ConfigError::InvalidHistoryLimit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credential_is_missing() {
        let result = ApiCredential::new(Some("   ".to_string()));
        assert!(matches!(result, Err(ConfigError::MissingCredential(var)) if var == API_KEY_ENV));
        assert!(ApiCredential::new(None).is_err());
    }

    #[test]
    fn credential_is_redacted_in_debug_output() {
        let credential = ApiCredential::new(Some(" sk-secret ".to_string())).unwrap();
        assert_eq!(credential.expose(), "sk-secret");
        assert!(!format!("{credential:?}").contains("sk-secret"));
    }

    #[test]
    fn endpoint_urls_join_without_double_slashes() {
        let credential = ApiCredential::new(Some("key".to_string())).unwrap();
        let endpoint = ApiEndpoint::new("https://example.test/v1/", credential, None).unwrap();
        assert_eq!(
            endpoint.url("/chat/completions"),
            "https://example.test/v1/chat/completions"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let credential = ApiCredential::new(Some("key".to_string())).unwrap();
        let result = ApiEndpoint::new("not a url", credential, None);
        assert!(matches!(result, Err(ConfigError::InvalidBaseUrl(_))));
    }

    #[test]
    fn settings_reject_out_of_range_values() {
        let mut settings = ChatSettings::default();
        assert!(settings.validate().is_ok());

        settings.parameters.temperature = 3.5;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidTemperature(_))
        ));

        settings.parameters.temperature = 0.0;
        settings.top_k = 0;
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidTopK)));

        settings.top_k = 2;
        settings.history_char_limit = 0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidHistoryLimit)
        ));
    }
}
