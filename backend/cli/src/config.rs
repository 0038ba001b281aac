use std::time::Duration;

use tracing::warn;

use umlscan_assistant::Locale;
use umlscan_media::DEFAULT_MAX_UPLOAD_BYTES;

/// Scanner service configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// Log level when `RUST_LOG` has no filter of its own
    pub log_level: String,
    /// Directory for rolling NDJSON logs; console only when unset
    pub log_dir: Option<String>,
    pub locale: Locale,
    /// Upper bound on each extraction or assistant call
    pub backend_timeout: Duration,
    pub max_upload_bytes: usize,

    // Extraction backends
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub vision_model: Option<String>,
    pub ocr_url: Option<String>,

    // Assistant
    pub openrouter_api_key: Option<String>,
    pub ollama_url: Option<String>,
    pub assistant_model: String,

    /// Allowed CORS origin; any origin when unset
    pub frontend_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_dir: None,
            locale: Locale::Es,
            backend_timeout: Duration::from_secs(30),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            openai_api_key: None,
            gemini_api_key: None,
            vision_model: None,
            ocr_url: None,
            openrouter_api_key: None,
            ollama_url: None,
            assistant_model: "openai/gpt-4o-mini".to_string(),
            frontend_url: None,
        }
    }
}

/// Non-empty value of an environment variable.
fn var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = var(name)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = name, value = %raw, "Ignoring unparseable setting");
            None
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: var("UMLSCAN_BIND").unwrap_or(defaults.bind_address),
            port: parsed("UMLSCAN_PORT").unwrap_or(defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            log_dir: var("UMLSCAN_LOG_DIR"),
            locale: parsed("UMLSCAN_LOCALE").unwrap_or(defaults.locale),
            backend_timeout: parsed("UMLSCAN_BACKEND_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.backend_timeout),
            max_upload_bytes: parsed("UMLSCAN_MAX_UPLOAD_BYTES")
                .unwrap_or(defaults.max_upload_bytes),
            openai_api_key: var("OPENAI_API_KEY"),
            gemini_api_key: var("GEMINI_API_KEY"),
            vision_model: var("UMLSCAN_VISION_MODEL"),
            ocr_url: var("UMLSCAN_OCR_URL"),
            openrouter_api_key: var("OPENROUTER_API_KEY"),
            ollama_url: var("OLLAMA_URL"),
            assistant_model: var("UMLSCAN_ASSISTANT_MODEL").unwrap_or(defaults.assistant_model),
            frontend_url: var("FRONTEND_URL"),
        }
    }

    pub fn has_extraction_backend(&self) -> bool {
        self.openai_api_key.is_some() || self.gemini_api_key.is_some() || self.ocr_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.locale, Locale::Es);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert!(!config.has_extraction_backend());
    }
}
