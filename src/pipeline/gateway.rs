//! Model gateway: retry with full-jitter exponential backoff around a
//! `TextModel`.
//!
//! Transient provider failures (rate limiting, internal errors, temporary
//! unavailability) are retried up to `max_retries` attempts. Anything else
//! aborts immediately as `ModelFatal`. Running out of attempts yields
//! `ModelExhausted`.

use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::model::{ModelError, ModelInfo, ModelRegistry, TextModel};
use super::PipelineError;
use crate::config::ModelConfig;

/// Longest raw response excerpt written to debug logs.
const LOG_EXCERPT_CHARS: usize = 500;

/// Attempt ceiling and backoff bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ModelConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            max_attempts: config.max_retries,
            base_delay: seconds("base_delay", config.base_delay)?,
            max_delay: seconds("max_delay", config.max_delay)?,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// `min(base_delay * 2^attempt, max_delay)`.
    pub fn delay_ceiling(&self, attempt: u32) -> Duration {
        let factor = 2f64.powi(attempt.min(64) as i32);
        let secs = (self.base_delay.as_secs_f64() * factor).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Full jitter: uniform in `[0, delay_ceiling(attempt)]`.
    pub fn sample_delay<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let ceiling = self.delay_ceiling(attempt).as_secs_f64();
        Duration::from_secs_f64(rng.gen_range(0.0..=ceiling))
    }
}

fn seconds(name: &str, secs: f64) -> Result<Duration, PipelineError> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| PipelineError::Configuration(format!("{name} is not a valid duration: {e}")))
}

type Sleeper = Box<dyn Fn(Duration) + Send + Sync>;

/// Retrying front for a text model. Safe to share across threads.
pub struct ModelGateway {
    model: Box<dyn TextModel>,
    policy: RetryPolicy,
    rng: Mutex<StdRng>,
    sleeper: Sleeper,
}

impl ModelGateway {
    /// Wrap an existing model. The configuration is validated here so that
    /// bad tuning never surfaces at call time.
    pub fn new(model: Box<dyn TextModel>, config: &ModelConfig) -> Result<Self, PipelineError> {
        let policy = RetryPolicy::from_config(config)?;
        Ok(Self {
            model,
            policy,
            rng: Mutex::new(StdRng::from_entropy()),
            sleeper: Box::new(std::thread::sleep),
        })
    }

    /// Build the provider named in `config` from `registry` and wrap it.
    pub fn from_config(config: &ModelConfig, registry: &ModelRegistry) -> Result<Self, PipelineError> {
        let model = registry.create(config)?;
        Self::new(model, config)
    }

    /// Replace the jitter source, e.g. with a seeded generator.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Replace the blocking wait between attempts.
    pub fn with_sleeper<F>(mut self, sleeper: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn info(&self) -> ModelInfo {
        self.model.info()
    }

    /// Send `prompt` to the model, retrying transient failures.
    pub fn complete(&self, prompt: &str) -> Result<String, PipelineError> {
        let max_attempts = self.policy.max_attempts;
        let mut last_error: Option<ModelError> = None;

        for attempt in 0..max_attempts {
            match self.model.complete(prompt) {
                Ok(text) => {
                    tracing::debug!(
                        attempt = attempt + 1,
                        response = %excerpt(&text),
                        "Model call succeeded"
                    );
                    return Ok(text);
                }
                Err(e) if e.is_transient() => {
                    if attempt + 1 < max_attempts {
                        let delay = self.next_delay(attempt);
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Transient model error, retrying"
                        );
                        (self.sleeper)(delay);
                    } else {
                        tracing::warn!(
                            attempt = attempt + 1,
                            error = %e,
                            "Transient model error on final attempt"
                        );
                    }
                    last_error = Some(e);
                }
                Err(e) => {
                    tracing::error!(attempt = attempt + 1, error = %e, "Fatal model error");
                    return Err(PipelineError::ModelFatal(e));
                }
            }
        }

        Err(PipelineError::ModelExhausted {
            attempts: max_attempts,
            last: last_error
                .unwrap_or_else(|| ModelError::Unavailable("no attempts were made".into())),
        })
    }

    fn next_delay(&self, attempt: u32) -> Duration {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        self.policy.sample_delay(attempt, &mut *rng)
    }
}

fn excerpt(text: &str) -> String {
    text.chars().take(LOG_EXCERPT_CHARS).collect()
}
