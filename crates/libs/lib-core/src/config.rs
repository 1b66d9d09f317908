//! # Application Configuration
//!
//! Configuration is loaded from environment variables (a `.env` file is read first
//! when present) and validated on startup to fail fast if misconfigured.
//!
//! ```rust,no_run
//! use lib_core::config::Config;
//!
//! let config = Config::load().expect("invalid configuration");
//! println!("attachments go to {}", config.attachments_dir.display());
//! ```

use lib_utils::envs::{get_env, get_env_or, get_env_parse_or};
use std::path::PathBuf;

/// Settings for the OpenAI-compatible completion endpoint used by mentor search.
#[derive(Clone, Debug, Default)]
pub struct LlmConfig {
    /// Full `chat/completions` URL. Mentor search uses text matching when unset.
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.api_url.is_some()
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// SQLite database connection URL
    pub database_url: String,

    /// Secret key for JWT token signing and verification
    ///
    /// **Must be at least 32 characters long** for security.
    pub jwt_secret: String,

    /// JWT token validity period in hours
    ///
    /// Valid range: 1-720 hours (1 hour to 30 days)
    pub jwt_expiration_hours: i64,

    /// Directory backing the local attachment store
    pub attachments_dir: PathBuf,

    /// Externally visible base URL, used to build attachment download links
    pub public_base_url: String,

    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = get_env_or("DATABASE_URL", "sqlite:data/intelliconnect.db");

        let jwt_secret = get_env("JWT_SECRET").map_err(|e| e.to_string())?;

        let jwt_expiration_hours =
            get_env_parse_or("JWT_EXPIRATION_HOURS", 24).map_err(|e| e.to_string())?;

        let attachments_dir = PathBuf::from(get_env_or("ATTACHMENTS_DIR", "data/attachments"));

        let public_base_url = get_env_or("PUBLIC_BASE_URL", "http://127.0.0.1:3001")
            .trim_end_matches('/')
            .to_string();

        let llm = LlmConfig {
            api_url: get_env("LLM_API_URL").ok(),
            api_key: get_env("LLM_API_KEY").ok(),
            model: get_env_or("LLM_MODEL", "google/gemini-2.5-flash"),
        };

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration_hours,
            attachments_dir,
            public_base_url,
            llm,
        })
    }

    /// Validate configuration values against security and business rules.
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 characters long".to_string());
        }

        if self.jwt_expiration_hours < 1 || self.jwt_expiration_hours > 720 {
            return Err("JWT_EXPIRATION_HOURS must be between 1 and 720 (30 days)".to_string());
        }

        if !is_http_url(&self.public_base_url) {
            return Err("PUBLIC_BASE_URL must start with http:// or https://".to_string());
        }

        if let Some(url) = &self.llm.api_url {
            if !is_http_url(url) {
                return Err("LLM_API_URL must start with http:// or https://".to_string());
            }
        }

        Ok(())
    }

    /// Read `.env`, load from the environment and validate.
    pub fn load() -> Result<Self, String> {
        // A missing .env file is fine; the process environment may carry everything.
        let _ = dotenvy::dotenv();

        let config = Self::from_env()?;
        config.validate()?;
        Ok(config)
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
