use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            temperature: 0.8,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub gemini: Option<GeminiConfig>,
    pub preferences_path: Option<PathBuf>,
    pub cors_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            gemini: None,
            preferences_path: None,
            cors_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let host = var("QUIZ_HOST").unwrap_or(defaults.host);
        let port = match var("QUIZ_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid QUIZ_PORT {:?}: {}", raw, e))?,
            None => defaults.port,
        };

        let gemini = match var("GEMINI_API_KEY").or_else(|| var("API_KEY")) {
            Some(key) => {
                let mut gemini = GeminiConfig::new(key.trim());
                if let Some(url) = var("GEMINI_BASE_URL") {
                    gemini.base_url = url.trim_end_matches('/').to_string();
                }
                if let Some(model) = var("GEMINI_MODEL") {
                    gemini.model = model;
                }
                if let Some(t) = var("GEMINI_TEMPERATURE") {
                    gemini.temperature = t
                        .trim()
                        .parse()
                        .map_err(|e| anyhow::anyhow!("invalid GEMINI_TEMPERATURE {:?}: {}", t, e))?;
                }
                if let Some(t) = var("GEMINI_TIMEOUT_SECS") {
                    gemini.timeout_secs = t
                        .trim()
                        .parse()
                        .map_err(|e| anyhow::anyhow!("invalid GEMINI_TIMEOUT_SECS {:?}: {}", t, e))?;
                }
                Some(gemini)
            }
            None => None,
        };

        let preferences_path = match lookup("PREFERENCES_PATH") {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(PathBuf::from(path)),
            None => Some(PathBuf::from(format!(
                "{}/preferences.json",
                env!("CARGO_MANIFEST_DIR")
            ))),
        };

        let cors_origins = var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        Ok(Self {
            host,
            port,
            gemini,
            preferences_path,
            cors_origins,
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}
