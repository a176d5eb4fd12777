use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::{ModelError, ModelInfo, TextModel};
use crate::config::ModelConfig;
use crate::pipeline::PipelineError;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Google Gemini client over the Generative Language REST API.
pub struct GeminiModel {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::blocking::Client,
}

impl GeminiModel {
    pub fn new(config: &ModelConfig) -> Result<Self, PipelineError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| PipelineError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
            base_url: GEMINI_BASE_URL.to_string(),
            client,
        })
    }

    /// Point the client at a different API root (proxies, test servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Request body for models/{model}:generateContent
#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Response body from models/{model}:generateContent
#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn build_request(prompt: &str) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: vec![RequestContent {
            parts: vec![RequestPart { text: prompt }],
        }],
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_response(body: &str) -> Result<String, ModelError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| ModelError::MalformedResponse(e.to_string()))?;

    let content = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or_else(|| ModelError::MalformedResponse("No candidates in response".into()))?;

    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    Ok(text.trim().to_string())
}

impl TextModel for GeminiModel {
    fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(prompt))
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
            provider: "Google".into(),
            model: self.model.clone(),
            description: "Gemini model via Google Generative AI API".into(),
        }
    }
}
