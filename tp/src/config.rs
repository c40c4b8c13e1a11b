//! Task planner configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::{Backoff, RetryPolicy};
use crate::planning::{DEFAULT_SYSTEM_PROMPT, PlannerSettings};

/// Main task planner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level used when `--log-level` is not given
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// LLM endpoint and model configuration
    pub llm: LlmConfig,

    /// Retry behavior for model calls
    pub retry: RetryConfig,

    /// Storage configuration
    pub storage: StorageConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the API key environment variable is set. Call this before
    /// any model request to fail fast with a clear error message.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key().is_none() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        if self.llm.backup_model.as_deref() == Some(self.llm.primary_model.as_str()) {
            tracing::warn!("Backup model is the same as the primary model: {}", self.llm.primary_model);
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .taskplanner.yml
        let local_config = PathBuf::from(".taskplanner.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/taskplanner/taskplanner.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("taskplanner").join("taskplanner.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Planner settings derived from the llm and retry sections
    pub fn planner_settings(&self) -> PlannerSettings {
        PlannerSettings {
            primary_model: self.llm.primary_model.clone(),
            backup_model: self.llm.backup_model.clone().filter(|m| !m.trim().is_empty()),
            system_prompt: self.llm.system_prompt.clone(),
            max_tokens: self.llm.max_tokens,
            temperature: self.llm.temperature,
            top_p: self.llm.top_p,
            retry: self.retry.policy(),
        }
    }
}

/// LLM endpoint and model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL (OpenAI-compatible)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Model tried first
    #[serde(rename = "primary-model")]
    pub primary_model: String,

    /// Model tried once the primary is exhausted
    #[serde(rename = "backup-model")]
    pub backup_model: Option<String>,

    /// System instruction sent ahead of the prompt
    #[serde(rename = "system-prompt")]
    pub system_prompt: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    pub temperature: f64,

    #[serde(rename = "top-p")]
    pub top_p: f64,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let settings = PlannerSettings::default();
        Self {
            base_url: "https://router.huggingface.co".to_string(),
            api_key_env: "HF_API_KEY".to_string(),
            primary_model: settings.primary_model,
            backup_model: settings.backup_model,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            top_p: settings.top_p,
            timeout_ms: 120_000,
        }
    }
}

impl LlmConfig {
    /// The API key from the configured environment variable, if set and non-empty
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.trim().is_empty())
    }
}

/// Backoff strategy name in config files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    #[default]
    Fixed,
    Exponential,
}

/// Retry behavior for model calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per model
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Delay between attempts (initial delay for exponential backoff)
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,

    pub backoff: BackoffStrategy,

    /// Upper bound for exponential backoff
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 5_000,
            backoff: BackoffStrategy::Fixed,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        let delay = Duration::from_millis(self.delay_ms);
        let backoff = match self.backoff {
            BackoffStrategy::Fixed => Backoff::Fixed(delay),
            BackoffStrategy::Exponential => Backoff::Exponential {
                initial: delay,
                max: Duration::from_millis(self.max_delay_ms.max(self.delay_ms)),
            },
        };
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            backoff,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file
    #[serde(rename = "db-path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/taskplanner on Linux)
        let db_path = dirs::data_local_dir()
            .map(|d| d.join("taskplanner").join("tasks.db"))
            .unwrap_or_else(|| PathBuf::from(".taskplanner/tasks.db"))
            .to_string_lossy()
            .into_owned();

        Self { db_path }
    }
}

impl StorageConfig {
    /// Database path with a leading `~/` resolved
    pub fn expanded_db_path(&self) -> PathBuf {
        match self.db_path.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(rest)),
            None => PathBuf::from(&self.db_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.primary_model, "openai/gpt-oss-120b");
        assert_eq!(config.llm.backup_model.as_deref(), Some("meta-llama/Llama-3.1-8B-Instruct"));
        assert_eq!(config.llm.api_key_env, "HF_API_KEY");
        assert_eq!(config.llm.base_url, "https://router.huggingface.co");
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.storage.db_path.ends_with("tasks.db"));
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug
llm:
  base-url: https://api.example.com
  api-key-env: MY_API_KEY
  primary-model: big-model
  backup-model: small-model
  max-tokens: 2000
  temperature: 0.5
  top-p: 0.8
  timeout-ms: 60000
retry:
  max-attempts: 5
  delay-ms: 250
  backoff: exponential
  max-delay-ms: 2000
storage:
  db-path: /tmp/plans.db
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.llm.primary_model, "big-model");
        assert_eq!(config.llm.api_key_env, "MY_API_KEY");
        assert_eq!(config.llm.max_tokens, 2000);
        assert_eq!(config.llm.top_p, 0.8);
        assert_eq!(config.storage.expanded_db_path(), PathBuf::from("/tmp/plans.db"));

        let policy = config.retry.policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(
            policy.backoff,
            Backoff::Exponential {
                initial: Duration::from_millis(250),
                max: Duration::from_millis(2000),
            }
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  primary-model: other-model
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.primary_model, "other-model");
        assert_eq!(config.llm.api_key_env, "HF_API_KEY");
        assert_eq!(config.llm.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.retry.policy(), RetryPolicy::default());
    }

    #[test]
    fn test_planner_settings() {
        let mut config = Config::default();
        config.llm.backup_model = Some("  ".to_string());
        config.retry.max_attempts = 0;

        let settings = config.planner_settings();
        assert_eq!(settings.backup_model, None);
        assert_eq!(settings.retry.max_attempts, 1);
        assert_eq!(settings.temperature, 0.3);
    }

    #[test]
    fn test_expanded_db_path_tilde() {
        let storage = StorageConfig {
            db_path: "~/plans/tasks.db".to_string(),
        };
        let path = storage.expanded_db_path();
        assert!(path.ends_with("plans/tasks.db"));
        assert!(!path.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "retry:\n  max-attempts: 7\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.retry.max_attempts, 7);
    }

    #[test]
    fn test_load_explicit_path_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    #[serial]
    fn test_validate_requires_api_key() {
        let mut config = Config::default();
        config.llm.api_key_env = "TASKPLANNER_TEST_API_KEY".to_string();

        // SAFETY: serialized with the other env-touching tests
        unsafe { std::env::remove_var("TASKPLANNER_TEST_API_KEY") };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("TASKPLANNER_TEST_API_KEY"));

        unsafe { std::env::set_var("TASKPLANNER_TEST_API_KEY", "") };
        assert!(config.validate().is_err());

        unsafe { std::env::set_var("TASKPLANNER_TEST_API_KEY", "hf_secret") };
        assert!(config.validate().is_ok());
        assert_eq!(config.llm.api_key().as_deref(), Some("hf_secret"));

        unsafe { std::env::remove_var("TASKPLANNER_TEST_API_KEY") };
    }
}
