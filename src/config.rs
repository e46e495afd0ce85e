use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub appdir: Option<String>,
    #[serde(default)]
    pub dbdir: Option<String>,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub midtrans: MidtransConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default)]
    pub tlscert: Option<String>,
    #[serde(default)]
    pub tlskey: Option<String>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: default_port(),
            tlscert: None,
            tlskey: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub sqlite: Option<SqliteConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SqliteConfig {
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Secret used to sign bearer tokens. Overridden by JWT_SECRET.
    #[serde(default)]
    pub jwt_secret: String,
    /// Token lifetime in days.
    #[serde(default = "default_token_days")]
    pub token_days: i64,
    /// Audience expected on Google id_tokens. Overridden by GOOGLE_CLIENT_ID.
    #[serde(default)]
    pub google_client_id: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_days: default_token_days(),
            google_client_id: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MidtransConfig {
    /// Overridden by MT_SERVER_KEY.
    #[serde(default)]
    pub server_key: String,
    /// Overridden by MT_CLIENT_KEY.
    #[serde(default)]
    pub client_key: String,
    #[serde(default = "default_snap_url")]
    pub snap_url: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for MidtransConfig {
    fn default() -> Self {
        Self {
            server_key: String::new(),
            client_key: String::new(),
            snap_url: default_snap_url(),
            api_url: default_api_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AiConfig {
    /// Overridden by OPENAI_API_KEY.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_ai_url")]
    pub base_url: String,
    #[serde(default = "default_ai_model")]
    pub model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_ai_url(),
            model: default_ai_model(),
        }
    }
}

fn default_port() -> String {
    "3000".to_string()
}

fn default_token_days() -> i64 {
    30
}

fn default_snap_url() -> String {
    "https://app.sandbox.midtrans.com".to_string()
}

fn default_api_url() -> String {
    "https://api.sandbox.midtrans.com".to_string()
}

fn default_ai_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_string(), e))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_string(), e))?;

        config.apply_env();
        Ok(config)
    }

    /// Environment variables win over file values so secrets can stay out of
    /// the config file entirely.
    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Ok(v) = std::env::var("GOOGLE_CLIENT_ID") {
            self.auth.google_client_id = v;
        }
        if let Ok(v) = std::env::var("MT_SERVER_KEY") {
            self.midtrans.server_key = v;
        }
        if let Ok(v) = std::env::var("MT_CLIENT_KEY") {
            self.midtrans.client_key = v;
        }
        if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            self.ai.api_key = v;
        }
    }

    pub fn get_database_path(&self) -> Option<String> {
        if let Some(ref sqlite) = self.database.sqlite {
            return Some(sqlite.filename.clone());
        }

        if let Some(ref dbdir) = self.dbdir {
            let path = PathBuf::from(dbdir).join("moflix.db");
            return Some(path.to_string_lossy().to_string());
        }

        None
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(String, serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
