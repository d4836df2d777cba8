use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use study_core::generation::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use study_core::storage::RedbProgressStore;
use study_core::{GeneratorConfig, OpenAiGenerator, ProgressTracker, RetryConfig, TextGenerator};
use study_mcp::tools::study_registry;
use study_mcp::Dispatcher;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(skip)]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_progress_file")]
    pub progress_file: String,
}

fn default_progress_file() -> String {
    "progress.redb".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            progress_file: default_progress_file(),
        }
    }
}

/// Text-generation service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl LlmConfig {
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            retry: RetryConfig {
                max_retries: self.max_retries,
                ..Default::default()
            },
        }
    }
}

/// Bearer tokens accepted by the direct tool endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// token -> user name
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

impl AuthConfig {
    pub fn user_for_token(&self, token: &str) -> Option<&str> {
        self.tokens.get(token).map(String::as_str)
    }
}

impl ServerConfig {
    pub fn load(config_path: &Path, data_dir: PathBuf) -> Result<Self> {
        // Create data directory if it doesn't exist
        std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        // Load config file if it exists, otherwise use defaults
        let mut config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")?
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Self {
                data_dir: data_dir.clone(),
                storage: Default::default(),
                llm: Default::default(),
                auth: Default::default(),
            }
        };

        config.data_dir = data_dir;

        Ok(config)
    }

    /// Apply command-line / environment overrides. Blank values are ignored.
    pub fn with_overrides(mut self, api_key: Option<String>, model: Option<String>) -> Self {
        if let Some(api_key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(api_key);
        }
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.llm.model = model;
        }
        self
    }

    /// Get the progress database path
    pub fn progress_path(&self) -> PathBuf {
        self.data_dir.join(&self.storage.progress_file)
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub tracker: Arc<ProgressTracker>,
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let store = RedbProgressStore::new(config.progress_path())
            .context("Failed to create progress store")?;
        let tracker = Arc::new(ProgressTracker::new(Arc::new(store)));

        let generator = OpenAiGenerator::new(config.llm.generator_config())
            .context("Failed to create text generator")?;
        if !generator.is_configured() {
            tracing::warn!("No OpenAI API key configured; content tools will fail until one is set");
        }
        tracing::info!(model = generator.model(), "Text generation configured");

        Self::with_generator(Arc::new(generator), tracker, config.auth.clone())
    }

    pub fn with_generator(
        generator: Arc<dyn TextGenerator>,
        tracker: Arc<ProgressTracker>,
        auth: AuthConfig,
    ) -> Result<Self> {
        let registry = study_registry(generator, tracker.clone())
            .context("Failed to register tools")?;
        tracing::info!("Registered {} tools", registry.len());

        Ok(Self {
            dispatcher: Dispatcher::new(Arc::new(registry)),
            tracker,
            auth: Arc::new(auth),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");

        let config = ServerConfig::load(&temp_dir.path().join("missing.toml"), data_dir.clone()).unwrap();

        assert!(data_dir.exists());
        assert_eq!(config.progress_path(), data_dir.join("progress.redb"));
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert!(config.llm.api_key.is_none());
        assert!(config.auth.tokens.is_empty());
    }

    #[test]
    fn test_load_from_file_with_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("study.toml");
        std::fs::write(
            &config_path,
            r#"
[llm]
model = "gpt-4o-mini"
timeout_secs = 15

[auth.tokens]
"token-abc" = "alice"
"#,
        )
        .unwrap();

        let config = ServerConfig::load(&config_path, temp_dir.path().join("data"))
            .unwrap()
            .with_overrides(Some("sk-env".to_string()), Some("  ".to_string()));

        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.llm.generator_config().timeout, Duration::from_secs(15));
        assert_eq!(config.llm.max_retries, 2);
        assert_eq!(config.auth.user_for_token("token-abc"), Some("alice"));
        assert_eq!(config.auth.user_for_token("other"), None);
        assert_eq!(config.storage.progress_file, "progress.redb");
    }
}
