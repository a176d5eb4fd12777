use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::{ModelError, ModelInfo, TextModel};
use crate::config::ModelConfig;
use crate::pipeline::PipelineError;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 120;
const TEMPERATURE: f32 = 0.7;

/// OpenAI chat-completions client.
pub struct OpenAiModel {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::blocking::Client,
}

impl OpenAiModel {
    pub fn new(config: &ModelConfig) -> Result<Self, PipelineError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| PipelineError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
            base_url: OPENAI_BASE_URL.to_string(),
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

fn build_request<'a>(model: &'a str, prompt: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        temperature: TEMPERATURE,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
    }
}

fn parse_response(body: &str) -> Result<String, ModelError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| ModelError::MalformedResponse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| ModelError::MalformedResponse("No message content in response".into()))
}

impl TextModel for OpenAiModel {
    fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&build_request(&self.model, prompt))
            .send()
            .map_err(ModelError::from_reqwest)?;

        let status = response.status();
        let body = response.text().map_err(ModelError::from_reqwest)?;
        if !status.is_success() {
            return Err(ModelError::from_status(status.as_u16(), body));
        }

        parse_response(&body)
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            provider: "OpenAI".into(),
            model: self.model.clone(),
            description: "OpenAI model via Chat Completion API".into(),
        }
    }
}
