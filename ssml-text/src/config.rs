//! Editor configuration: chunk budget and supported input files.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::{Result, TextError};

// Defaults for the synthesis backend's request size
const DEFAULT_TEXT_LIMIT: usize = 1500;
const DEFAULT_ELASTIC_VALUE: usize = 200;

/// Character budget applied to every emitted chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkBudget {
    /// Maximum length of a non-final chunk
    pub limit: usize,
    /// Escaping cost tolerated on the final remainder of a split
    pub elastic: usize,
}

impl ChunkBudget {
    /// Create a budget, rejecting a zero limit.
    pub fn new(limit: usize, elastic: usize) -> Result<Self> {
        if limit == 0 {
            return Err(TextError::InvalidBudget(
                "text limit must be at least 1".into(),
            ));
        }
        Ok(Self { limit, elastic })
    }
}

impl Default for ChunkBudget {
    fn default() -> Self {
        Self {
            limit: DEFAULT_TEXT_LIMIT,
            elastic: DEFAULT_ELASTIC_VALUE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Maximum characters per synthesis request
    #[serde(default = "default_text_limit")]
    pub text_limit: usize,

    /// Escaping cost allowed on the last chunk of an insertion
    #[serde(default = "default_elastic_value")]
    pub elastic_value: usize,

    /// File extensions accepted by `open_text_file` (with leading dot)
    #[serde(default = "default_supported_extensions")]
    pub supported_extensions: Vec<String>,
}

fn default_text_limit() -> usize {
    DEFAULT_TEXT_LIMIT
}

fn default_elastic_value() -> usize {
    DEFAULT_ELASTIC_VALUE
}

fn default_supported_extensions() -> Vec<String> {
    vec![".txt".to_string(), ".ssml".to_string(), ".xml".to_string()]
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            text_limit: default_text_limit(),
            elastic_value: default_elastic_value(),
            supported_extensions: default_supported_extensions(),
        }
    }
}

impl EditorConfig {
    /// Get the config file path: ~/.config/cli-programs/ssml-text.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| TextError::ConfigError("HOME not set".into()))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("ssml-text.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: EditorConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Validated chunk budget for this configuration.
    pub fn budget(&self) -> Result<ChunkBudget> {
        ChunkBudget::new(self.text_limit, self.elastic_value)
    }
}
