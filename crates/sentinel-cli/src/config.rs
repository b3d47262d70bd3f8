//! Configuration management for the CLI.
//!
//! One TOML file holds the portfolio and the settings of every stage:
//!
//! ```toml
//! classifier = "llm"
//!
//! [settings]
//! color = true
//! format = "table"
//!
//! [llm]
//! backend = "ollama"
//! model = "llama3"
//!
//! [extractor]
//! confidence_threshold = 0.3
//!
//! [pipeline]
//! max_concurrency = 4
//!
//! [store]
//! backend = "sqlite"
//! path = "sentinel-state.db"
//!
//! [[companies]]
//! name = "Acme Corp"
//! ticker = "ACME"
//! languages = ["en", "de"]
//! ```

use crate::error::{CliError, Result};
use sentinel_domain::Company;
use sentinel_extractor::ExtractorConfig;
use sentinel_llm::{LlmBackend, LlmConfig};
use sentinel_pipeline::PipelineConfig;
use sentinel_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable selecting the LLM backend
pub const ENV_LLM_PROVIDER: &str = "SENTINEL_LLM_PROVIDER";

/// Environment variable holding the OpenAI API key
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Environment variable overriding the state store path
pub const ENV_STORE_PATH: &str = "SENTINEL_STORE_PATH";

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Which classifier groups articles into incidents
    #[serde(default)]
    pub classifier: ClassifierKind,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// LLM backend
    #[serde(default)]
    pub llm: LlmConfig,

    /// Extraction and dedupe tuning
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Run orchestration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Weekly state persistence
    #[serde(default)]
    pub store: StoreConfig,

    /// The monitored portfolio
    #[serde(default)]
    pub companies: Vec<Company>,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

/// Classifier selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// LLM-backed classifier using the `[llm]` section
    #[default]
    Llm,
    /// Offline keyword rules
    Keyword,
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".sentinel").join("config.toml"))
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist; a missing default file yields the default
    /// configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_path()?, false),
        };

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            Self::from_toml_str(&contents)
        } else if explicit {
            Err(CliError::Config(format!("Config file {} not found", path.display())))
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Apply environment overrides read through `var`.
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = var(ENV_LLM_PROVIDER) {
            self.llm.backend = match provider.trim().to_lowercase().as_str() {
                "ollama" => LlmBackend::Ollama,
                "openai" => LlmBackend::OpenAi,
                other => {
                    return Err(CliError::Config(format!(
                        "{} must be 'ollama' or 'openai', got '{}'",
                        ENV_LLM_PROVIDER, other
                    )))
                }
            };
        }
        if let Some(key) = var(ENV_OPENAI_API_KEY).filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(path) = var(ENV_STORE_PATH).filter(|p| !p.trim().is_empty()) {
            self.store.path = PathBuf::from(path);
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|name| std::env::var(name).ok())
    }

    /// Validate every section and the portfolio.
    pub fn validate(&self) -> Result<()> {
        if self.classifier == ClassifierKind::Llm {
            self.llm.validate().map_err(|e| CliError::Config(format!("[llm] {}", e)))?;
        }
        self.extractor
            .validate()
            .map_err(|e| CliError::Config(format!("[extractor] {}", e)))?;
        self.pipeline
            .validate()
            .map_err(|e| CliError::Config(format!("[pipeline] {}", e)))?;
        self.store
            .validate()
            .map_err(|e| CliError::Config(format!("[store] {}", e)))?;

        let mut seen = HashSet::new();
        for company in &self.companies {
            if company.name.trim().is_empty() {
                return Err(CliError::Config("company name must not be empty".into()));
            }
            if !seen.insert(company.name.as_str()) {
                return Err(CliError::Config(format!("company '{}' is listed twice", company.name)));
            }
            if company.languages.is_empty() {
                return Err(CliError::Config(format!("company '{}' has no languages", company.name)));
            }
        }
        Ok(())
    }

    /// Starter configuration written by `sentinel init`.
    pub fn sample() -> Self {
        let mut acme = Company::new("Acme Corp", "ACME");
        acme.aliases = vec!["Acme".to_string()];
        acme.languages = vec!["en".to_string(), "de".to_string()];

        Self {
            companies: vec![acme, Company::new("Globex", "GLBX")],
            ..Self::default()
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
