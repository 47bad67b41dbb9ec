//! Configuration types and structures.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3005;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Config {
    /// Load a single configuration file without tier merging.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        // Empty or comment-only YAML parses as null
        let config: Option<Config> = serde_yaml::from_str(&content)?;
        Ok(config.unwrap_or_default())
    }

    /// Socket address string for the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}

/// HTTP listener and storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// SQLite database file (default: data/taskboard.db).
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Bind address (default: 127.0.0.1).
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port (default: 3005).
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/taskboard.db")
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Token signing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret. A random per-process secret is used when unset.
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Token lifetime in hours (default: 24).
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,

    /// bcrypt work factor for new password hashes (default: 10).
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: default_token_ttl_hours(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

fn default_token_ttl_hours() -> u64 {
    24
}

fn default_bcrypt_cost() -> u32 {
    crate::auth::password::DEFAULT_COST
}

/// Provider selection and per-provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Provider used when a request carries no recognised hint.
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Upper bound on a single generation call, in milliseconds (default: 60000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub watsonx: WatsonxConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            timeout_ms: default_timeout_ms(),
            openai: OpenAiConfig::default(),
            watsonx: WatsonxConfig::default(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_timeout_ms() -> u64 {
    60_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            api_key_env: default_openai_key_env(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatsonxConfig {
    #[serde(default = "default_watsonx_service_url")]
    pub service_url: String,

    #[serde(default = "default_watsonx_iam_url")]
    pub iam_url: String,

    /// API version date sent as the `version` query parameter.
    #[serde(default = "default_watsonx_version")]
    pub version: String,

    #[serde(default = "default_watsonx_model")]
    pub model: String,

    #[serde(default)]
    pub project_id: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default = "default_watsonx_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
}

impl Default for WatsonxConfig {
    fn default() -> Self {
        Self {
            service_url: default_watsonx_service_url(),
            iam_url: default_watsonx_iam_url(),
            version: default_watsonx_version(),
            model: default_watsonx_model(),
            project_id: None,
            api_key_env: default_watsonx_key_env(),
            max_new_tokens: default_max_new_tokens(),
        }
    }
}

fn default_watsonx_service_url() -> String {
    "https://us-south.ml.cloud.ibm.com".to_string()
}

fn default_watsonx_iam_url() -> String {
    "https://iam.cloud.ibm.com/identity/token".to_string()
}

fn default_watsonx_version() -> String {
    "2024-05-31".to_string()
}

fn default_watsonx_model() -> String {
    "ibm/granite-3-8b-instruct".to_string()
}

fn default_watsonx_key_env() -> String {
    "WATSONX_APIKEY".to_string()
}

fn default_max_new_tokens() -> u32 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let config = Config::default();
        assert_eq!(config.server.port, 3005);
        assert_eq!(config.listen_addr(), "127.0.0.1:3005");
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert_eq!(config.auth.bcrypt_cost, 10);
        assert_eq!(config.generation.timeout_ms, 60_000);
        assert_eq!(config.generation.watsonx.max_new_tokens, 300);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str(
            "generation:\n  openai:\n    model: gpt-4.1\n",
        )
        .unwrap();
        assert_eq!(config.generation.openai.model, "gpt-4.1");
        assert_eq!(config.generation.openai.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.server.db_path, PathBuf::from("data/taskboard.db"));
    }
}
