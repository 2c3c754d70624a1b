//! Configuration loading, validation, and taxonomy parsing for Guidepost.
//!
//! Loads configuration from a TOML file with environment variable
//! overrides, and loads the skill taxonomy (`[[skills]]` tables) that the
//! registry is built from. All settings are validated at startup.

use guidepost_core::SkillDef;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `guidepost.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the taxonomy file ([[skills]] tables).
    #[serde(default = "default_taxonomy_path")]
    pub taxonomy_path: PathBuf,

    /// Root directory content refs are resolved against.
    #[serde(default = "default_content_root")]
    pub content_root: PathBuf,

    /// Trigger matching weights and thresholds.
    #[serde(default)]
    pub matcher: MatcherSettings,

    /// Content loading and caching.
    #[serde(default)]
    pub loader: LoaderSettings,

    /// Response assembly.
    #[serde(default)]
    pub assembler: AssemblerSettings,
}

fn default_taxonomy_path() -> PathBuf {
    PathBuf::from("taxonomy.toml")
}
fn default_content_root() -> PathBuf {
    PathBuf::from("content")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherSettings {
    /// Weight for an exact phrase hit.
    #[serde(default = "default_phrase_weight")]
    pub phrase_weight: f32,

    /// Weight for the keyword-overlap ratio.
    #[serde(default = "default_overlap_weight")]
    pub overlap_weight: f32,

    /// Weight subtracted per matched negative trigger.
    #[serde(default = "default_negative_weight")]
    pub negative_weight: f32,

    /// Multiplier applied to a skill's static weight.
    #[serde(default = "default_weight_factor")]
    pub weight_factor: f32,

    /// Ranking is ambiguous when (top - second) < epsilon * top.
    #[serde(default = "default_ambiguity_epsilon")]
    pub ambiguity_epsilon: f32,
}

fn default_phrase_weight() -> f32 {
    3.0
}
fn default_overlap_weight() -> f32 {
    1.0
}
fn default_negative_weight() -> f32 {
    2.0
}
fn default_weight_factor() -> f32 {
    0.01
}
fn default_ambiguity_epsilon() -> f32 {
    0.10
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            phrase_weight: default_phrase_weight(),
            overlap_weight: default_overlap_weight(),
            negative_weight: default_negative_weight(),
            weight_factor: default_weight_factor(),
            ambiguity_epsilon: default_ambiguity_epsilon(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderSettings {
    /// Maximum number of cached content units.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,

    /// Per-fetch timeout in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_cache_capacity() -> u64 {
    256
}
fn default_fetch_timeout_secs() -> u64 {
    10
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblerSettings {
    /// Maximum response size in characters.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_max_chars() -> usize {
    8_000
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a file, falling back to defaults when the
    /// file does not exist.
    ///
    /// Environment variable overrides (highest priority):
    /// - `GUIDEPOST_TAXONOMY` — taxonomy file path
    /// - `GUIDEPOST_CONTENT_ROOT` — content root directory
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

            toml::from_str::<Self>(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Self::default()
        };

        if let Ok(taxonomy) = std::env::var("GUIDEPOST_TAXONOMY") {
            config.taxonomy_path = PathBuf::from(taxonomy);
        }
        if let Ok(root) = std::env::var("GUIDEPOST_CONTENT_ROOT") {
            config.content_root = PathBuf::from(root);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.matcher.phrase_weight <= 0.0 || self.matcher.overlap_weight <= 0.0 {
            return Err(ConfigError::ValidationError(
                "phrase_weight and overlap_weight must be > 0".into(),
            ));
        }

        if !(0.0..1.0).contains(&self.matcher.ambiguity_epsilon) {
            return Err(ConfigError::ValidationError(
                "ambiguity_epsilon must be in [0.0, 1.0)".into(),
            ));
        }

        if self.loader.cache_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "cache_capacity must be > 0".into(),
            ));
        }

        if self.assembler.max_chars == 0 {
            return Err(ConfigError::ValidationError("max_chars must be > 0".into()));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            taxonomy_path: default_taxonomy_path(),
            content_root: default_content_root(),
            matcher: MatcherSettings::default(),
            loader: LoaderSettings::default(),
            assembler: AssemblerSettings::default(),
        }
    }
}

/// The on-disk shape of a taxonomy file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyFile {
    #[serde(default)]
    pub skills: Vec<SkillDef>,
}

/// Load raw skill definitions from a taxonomy TOML file.
///
/// Only the file shape is validated here; id uniqueness and tree shape are
/// the registry's responsibility at build time.
pub fn load_taxonomy(path: &Path) -> Result<Vec<SkillDef>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let file: TaxonomyFile = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(file.skills)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
