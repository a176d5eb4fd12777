//! Provider registry: maps a provider name to a constructor.

use std::collections::BTreeMap;

use super::gemini::GeminiModel;
use super::openai::OpenAiModel;
use super::types::TextModel;
use crate::config::ModelConfig;
use crate::pipeline::PipelineError;

/// Builds a provider from a validated configuration.
pub type ModelConstructor = fn(&ModelConfig) -> Result<Box<dyn TextModel>, PipelineError>;

pub struct ModelRegistry {
    constructors: BTreeMap<String, ModelConstructor>,
}

impl ModelRegistry {
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registry with the `gemini` and `openai` providers.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("gemini", build_gemini);
        registry.register("openai", build_openai);
        registry
    }

    pub fn register(&mut self, name: &str, constructor: ModelConstructor) {
        self.constructors.insert(normalize(name), constructor);
    }

    /// Registered provider names, sorted.
    pub fn available(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Validate `config` and build the provider named by `config.provider`.
    pub fn create(&self, config: &ModelConfig) -> Result<Box<dyn TextModel>, PipelineError> {
        config.validate()?;
        let key = normalize(&config.provider);
        let constructor = self.constructors.get(&key).ok_or_else(|| {
            PipelineError::Configuration(format!(
                "Unknown model type: {}. Available: {:?}",
                config.provider,
                self.available()
            ))
        })?;
        constructor(config)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

fn build_gemini(config: &ModelConfig) -> Result<Box<dyn TextModel>, PipelineError> {
    Ok(Box::new(GeminiModel::new(config)?))
}

fn build_openai(config: &ModelConfig) -> Result<Box<dyn TextModel>, PipelineError> {
    Ok(Box::new(OpenAiModel::new(config)?))
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
