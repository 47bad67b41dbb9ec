//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Embedded defaults (lowest priority)
    Defaults = 0,
    /// Project-level config ($CWD/taskboard/)
    Project = 1,
    /// User-level config (~/.taskboard/)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Paths for each configuration tier.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project-level config directory
    pub project_dir: Option<PathBuf>,
    /// User-level config directory
    pub user_dir: Option<PathBuf>,
    /// Explicit config file that replaces the file tiers
    pub explicit_file: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        let user_dir = std::env::var("TASKBOARD_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".taskboard")));

        let project_dir = std::env::var("TASKBOARD_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("taskboard")));

        let explicit_file = std::env::var("TASKBOARD_CONFIG_PATH").ok().map(PathBuf::from);

        Self {
            project_dir,
            user_dir,
            explicit_file,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
            explicit_file: None,
        }
    }

    /// Use a single file instead of the project and user tiers.
    pub fn with_explicit_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }
}

/// Read a YAML file as a JSON value for merging. Missing files are skipped.
fn read_tier(path: &Path, tier: ConfigTier) -> Option<Value> {
    if !path.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), %tier, error = %e, "Skipping unreadable config file");
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), %tier, error = %e, "Skipping invalid config file");
            None
        }
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Paths for each tier
    pub paths: ConfigPaths,
    /// Loaded configuration
    config: Config,
    /// Config files that contributed, lowest tier first
    sources: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    pub fn load() -> Result<Self> {
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        Self::load_with_env(paths, |key| std::env::var(key).ok())
    }

    /// Load configuration reading environment overrides through `env`.
    pub fn load_with_env(paths: ConfigPaths, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut configs: Vec<Value> = Vec::new();
        let mut sources = Vec::new();

        // Tier 1: Defaults
        configs.push(serde_json::to_value(Config::default())?);

        if let Some(explicit) = &paths.explicit_file {
            // An explicit file must exist and parse
            let content = std::fs::read_to_string(explicit)
                .with_context(|| format!("reading config file {}", explicit.display()))?;
            let value: Value = serde_yaml::from_str(&content)
                .with_context(|| format!("parsing config file {}", explicit.display()))?;
            configs.push(value);
            sources.push(explicit.clone());
        } else {
            // Tier 2: Project config, then Tier 3: User config
            let tiers = [
                (paths.project_dir.as_ref(), ConfigTier::Project),
                (paths.user_dir.as_ref(), ConfigTier::User),
            ];
            for (dir, tier) in tiers {
                let Some(dir) = dir else { continue };
                let file = dir.join("config.yaml");
                if let Some(value) = read_tier(&file, tier) {
                    configs.push(value);
                    sources.push(file);
                }
            }
        }

        let merged = deep_merge_all(configs);
        let mut config: Config = serde_json::from_value(merged)?;

        // Tier 4: Environment variable overrides
        Self::apply_env_overrides(&mut config, env);

        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    /// Apply environment variable overrides to config.
    fn apply_env_overrides(config: &mut Config, env: impl Fn(&str) -> Option<String>) {
        if let Some(db_path) = env("TASKBOARD_DB_PATH") {
            config.server.db_path = PathBuf::from(db_path);
        }

        if let Some(bind) = env("TASKBOARD_BIND") {
            config.server.bind = bind;
        }

        let port = env("TASKBOARD_PORT").or_else(|| env("PORT"));
        if let Some(port) = port {
            match port.trim().parse() {
                Ok(port) => config.server.port = port,
                Err(_) => warn!(%port, "Ignoring invalid port from environment"),
            }
        }

        if let Some(secret) = env("JWT_SECRET") {
            config.auth.jwt_secret = Some(secret);
        }

        if let Some(provider) = env("DEFAULT_MODEL_PROVIDER") {
            config.generation.default_provider = provider;
        }

        if let Some(model) = env("OPENAI_MODEL") {
            config.generation.openai.model = model;
        }

        if let Some(model) = env("WATSONX_MODEL") {
            config.generation.watsonx.model = model;
        }

        if let Some(project_id) = env("WATSONX_AI_PROJECT_ID") {
            config.generation.watsonx.project_id = Some(project_id);
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Config files that contributed to the result.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(
            Some(temp.path().join("project")),
            Some(temp.path().join("user")),
        );

        let loader = ConfigLoader::load_with_env(paths, |_| None).unwrap();
        assert!(loader.sources().is_empty());
        assert_eq!(loader.config().server.bind, "127.0.0.1");
        assert_eq!(loader.config().generation.default_provider, "openai");
    }

    #[test]
    fn test_user_config_overrides_project() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("taskboard");
        let user_dir = temp.path().join("user");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::create_dir_all(&user_dir).unwrap();

        std::fs::write(
            project_dir.join("config.yaml"),
            "server:\n  port: 4000\n  bind: 0.0.0.0\n",
        )
        .unwrap();
        std::fs::write(user_dir.join("config.yaml"), "server:\n  port: 5000\n").unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), Some(user_dir));
        let loader = ConfigLoader::load_with_env(paths, |_| None).unwrap();
        let config = loader.config();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(loader.sources().len(), 2);
    }

    #[test]
    fn test_invalid_tier_is_skipped() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("taskboard");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join("config.yaml"), "server: [unclosed").unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), None);
        let loader = ConfigLoader::load_with_env(paths, |_| None).unwrap();
        assert_eq!(loader.config().server.port, 3005);
    }

    #[test]
    fn test_explicit_file_replaces_tiers() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("taskboard");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join("config.yaml"), "server:\n  port: 4000\n").unwrap();
        let explicit = temp.path().join("custom.yaml");
        std::fs::write(&explicit, "auth:\n  token_ttl_hours: 1\n").unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), None).with_explicit_file(&explicit);
        let loader = ConfigLoader::load_with_env(paths, |_| None).unwrap();
        assert_eq!(loader.config().server.port, 3005);
        assert_eq!(loader.config().auth.token_ttl_hours, 1);

        let missing = ConfigPaths::with_dirs(None, None)
            .with_explicit_file(temp.path().join("missing.yaml"));
        assert!(ConfigLoader::load_with_env(missing, |_| None).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TASKBOARD_DB_PATH", "/tmp/tb.db"),
            ("PORT", "8080"),
            ("JWT_SECRET", "s3cret"),
            ("DEFAULT_MODEL_PROVIDER", "ibm"),
            ("WATSONX_AI_PROJECT_ID", "proj-1"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        ConfigLoader::apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.db_path, PathBuf::from("/tmp/tb.db"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.generation.default_provider, "ibm");
        assert_eq!(config.generation.watsonx.project_id.as_deref(), Some("proj-1"));
    }

    #[test]
    fn test_taskboard_port_wins_over_port() {
        let mut config = Config::default();
        ConfigLoader::apply_env_overrides(&mut config, |key| match key {
            "TASKBOARD_PORT" => Some("7000".to_string()),
            "PORT" => Some("8000".to_string()),
            _ => None,
        });
        assert_eq!(config.server.port, 7000);
    }
}
