//! Application configuration.
//!
//! Everything here is a plain value handed to components at construction;
//! nothing is read from process-wide state after startup.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::pipeline::PipelineError;

/// Application-level constants
pub const APP_NAME: &str = "transcript-actions";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Longest input still considered as a candidate transcript file path.
pub const MAX_FILENAME_LENGTH: usize = 255;

pub const DEFAULT_PROVIDER: &str = "gemini";
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_BASE_DELAY_SECS: f64 = 1.0;
pub const DEFAULT_MAX_DELAY_SECS: f64 = 8.0;

pub const ENV_PROVIDER: &str = "TRANSCRIPT_ACTIONS_PROVIDER";
pub const ENV_MODEL: &str = "TRANSCRIPT_ACTIONS_MODEL";
pub const ENV_MAX_RETRIES: &str = "TRANSCRIPT_ACTIONS_MAX_RETRIES";
pub const ENV_BASE_DELAY: &str = "TRANSCRIPT_ACTIONS_BASE_DELAY";
pub const ENV_MAX_DELAY: &str = "TRANSCRIPT_ACTIONS_MAX_DELAY";
pub const ENV_START_MARKER: &str = "TRANSCRIPT_ACTIONS_START_MARKER";
pub const ENV_END_MARKER: &str = "TRANSCRIPT_ACTIONS_END_MARKER";
pub const ENV_PROMPT_DIR: &str = "TRANSCRIPT_ACTIONS_PROMPT_DIR";

/// Default model name for a provider key.
pub fn default_model_for(provider: &str) -> &'static str {
    match provider.trim().to_lowercase().as_str() {
        "openai" => "gpt-4o",
        _ => "gemini-2.0-flash",
    }
}

/// Environment variable holding the credential for a provider key.
pub fn api_key_env_var(provider: &str) -> &'static str {
    match provider.trim().to_lowercase().as_str() {
        "openai" => "OPENAI_API_KEY",
        _ => "GEMINI_API_KEY",
    }
}

// ═══════════════════════════════════════════════════════════
// Model configuration
// ═══════════════════════════════════════════════════════════

/// Credentials and retry tuning for a text-generation provider.
///
/// Delays are in seconds.
#[derive(Clone, Deserialize)]
pub struct ModelConfig {
    pub provider: String,
    pub api_key: String,
    pub model: String,
    pub max_retries: u32,
    pub base_delay: f64,
    pub max_delay: f64,
}

impl ModelConfig {
    pub fn new(provider: &str, api_key: &str) -> Self {
        Self {
            provider: provider.to_string(),
            api_key: api_key.to_string(),
            model: default_model_for(provider).to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY_SECS,
            max_delay: DEFAULT_MAX_DELAY_SECS,
        }
    }

    /// Reject configurations that could only fail later, at call time.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.api_key.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "Missing or invalid API key".into(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "Model name must be a non-empty string".into(),
            ));
        }
        if self.max_retries == 0 {
            return Err(PipelineError::Configuration(
                "max_retries must be a positive integer".into(),
            ));
        }
        if !(self.base_delay.is_finite() && self.base_delay > 0.0) {
            return Err(PipelineError::Configuration(
                "base_delay must be a positive number".into(),
            ));
        }
        if !(self.max_delay.is_finite() && self.max_delay > self.base_delay) {
            return Err(PipelineError::Configuration(
                "max_delay must be greater than base_delay".into(),
            ));
        }
        // base_delay < max_delay, so checking the larger bound covers both.
        if Duration::try_from_secs_f64(self.max_delay).is_err() {
            return Err(PipelineError::Configuration(
                "max_delay is too large to represent as a duration".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════
// Pipeline settings
// ═══════════════════════════════════════════════════════════

/// Non-model pipeline settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    /// Text before this marker is discarded.
    pub start_marker: Option<String>,
    /// Text from this marker onward is discarded.
    pub end_marker: Option<String>,
    /// Directory to load prompt templates from. Built-in templates when unset.
    pub prompt_dir: Option<PathBuf>,
    pub max_filename_length: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            start_marker: None,
            end_marker: None,
            prompt_dir: None,
            max_filename_length: MAX_FILENAME_LENGTH,
        }
    }
}

impl PipelineSettings {
    /// Whether `input` looks like a path to an existing `.txt` transcript
    /// rather than transcript text.
    pub fn is_transcript_path(&self, input: &str) -> bool {
        input.chars().count() <= self.max_filename_length
            && !input.contains('\n')
            && input.to_lowercase().ends_with(".txt")
            && Path::new(input).is_file()
    }
}

// ═══════════════════════════════════════════════════════════
// Environment loading
// ═══════════════════════════════════════════════════════════

/// Complete application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub pipeline: PipelineSettings,
}

impl AppConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup. Unset keys fall back to defaults;
    /// set keys that fail to parse are configuration errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = get(ENV_PROVIDER).unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
        let api_key = get(api_key_env_var(&provider)).unwrap_or_default();
        let mut model = ModelConfig::new(&provider, &api_key);

        if let Some(name) = get(ENV_MODEL) {
            model.model = name;
        }
        if let Some(raw) = get(ENV_MAX_RETRIES) {
            model.max_retries = parse_value(ENV_MAX_RETRIES, &raw)?;
        }
        if let Some(raw) = get(ENV_BASE_DELAY) {
            model.base_delay = parse_value(ENV_BASE_DELAY, &raw)?;
        }
        if let Some(raw) = get(ENV_MAX_DELAY) {
            model.max_delay = parse_value(ENV_MAX_DELAY, &raw)?;
        }

        let pipeline = PipelineSettings {
            start_marker: get(ENV_START_MARKER),
            end_marker: get(ENV_END_MARKER),
            prompt_dir: get(ENV_PROMPT_DIR).map(PathBuf::from),
            max_filename_length: MAX_FILENAME_LENGTH,
        };

        Ok(Self { model, pipeline })
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, PipelineError> {
    raw.trim()
        .parse()
        .map_err(|_| PipelineError::Configuration(format!("{key} has invalid value '{raw}'")))
}
