//! Shared fixtures for pipeline and API tests.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::Router;
use tokio::sync::oneshot;

use super::gateway::ModelGateway;
use super::model::{MockTextModel, ModelError};
use super::prompt::{PromptKind, PromptSet};
use super::ActionPipeline;
use crate::config::{ModelConfig, PipelineSettings};

pub const TRANSCRIPT: &str =
    "[9:00 AM] Alice: Ship the report by Friday. [9:01 AM] Bob: Got it, I'll do it.";

/// Gateway with two attempts and no real sleeping.
pub fn gateway(model: Arc<MockTextModel>) -> ModelGateway {
    let mut config = ModelConfig::new("mock", "key");
    config.max_retries = 2;
    ModelGateway::new(Box::new(model), &config)
        .unwrap()
        .with_sleeper(|_| {})
}

/// Templates whose first line names the stage, so a stub model can route.
pub fn routed_prompts() -> PromptSet {
    [
        (PromptKind::Clustering, "CLUSTER\n{input_data}"),
        (PromptKind::Filtering, "FILTER\n{input_data}"),
        (PromptKind::Assignees, "ASSIGNEES\n{segment_data}"),
        (PromptKind::Deadlines, "DEADLINES\n{segment_data}\n{extracted_data}"),
        (PromptKind::Priority, "PRIORITY\n{segment_data}\n{extracted_data}"),
        (PromptKind::Category, "CATEGORY\n{segment_data}\n{extracted_data}"),
    ]
    .into_iter()
    .try_fold(PromptSet::builtin().unwrap(), |set, (kind, text)| {
        set.with_template(kind, text)
    })
    .unwrap()
}

/// Deterministic answers for `routed_prompts`: one actionable segment
/// assigned to Bob, due Friday, High, Feature Development.
pub fn stub_response(prompt: &str) -> Result<String, ModelError> {
    let body = match prompt.lines().next().unwrap_or_default() {
        "CLUSTER" => {
            r#"```json
{"segments": [{"segment_id": 1, "topic_summary": "Ship the report", "chunk_ids": [0, 1]}]}
```"#
        }
        "FILTER" => {
            r#"{"action_segments_found": "yes", "confidence_percentage": 95, "explanation": "Bob commits to the report."}"#
        }
        "ASSIGNEES" => r#"{"assignees": ["Bob"]}"#,
        "DEADLINES" => r#"{"deadlines": ["Friday"], "urgent_flags": [false]}"#,
        "PRIORITY" => r#"{"priority": "High", "confidence": 85, "reasoning": "Due this week"}"#,
        "CATEGORY" => r#"{"category": "Feature Development", "confidence": 70, "reasoning": "Delivery"}"#,
        other => return Err(ModelError::Rejected { status: 400, body: other.to_string() }),
    };
    Ok(body.to_string())
}

pub fn pipeline_with(model: Arc<MockTextModel>, settings: PipelineSettings) -> ActionPipeline {
    ActionPipeline::new(gateway(model), &routed_prompts(), settings)
}

pub fn pipeline(model: Arc<MockTextModel>) -> ActionPipeline {
    pipeline_with(model, PipelineSettings::default())
}

// ═══════════════════════════════════════════════════════════
// Scripted HTTP server for provider tests
// ═══════════════════════════════════════════════════════════

/// One request received by a `StubServer`.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Clone, Default)]
struct StubState {
    replies: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Loopback HTTP server answering every request with the next scripted
/// `(status, body)` pair. It runs its own runtime on a separate thread so
/// blocking clients can call it from a plain `#[test]`.
pub struct StubServer {
    addr: SocketAddr,
    state: StubState,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl StubServer {
    pub fn start(replies: &[(u16, &str)]) -> Self {
        let state = StubState::default();
        state.replies.lock().unwrap().extend(
            replies
                .iter()
                .map(|(code, body)| (StatusCode::from_u16(*code).unwrap(), body.to_string())),
        );

        let app = Router::new().fallback(reply).with_state(state.clone());
        let (addr_tx, addr_rx) = std::sync::mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                addr_tx.send(listener.local_addr().unwrap()).unwrap();
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .unwrap();
            });
        });

        Self {
            addr: addr_rx.recv().unwrap(),
            state,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

async fn reply(
    State(state): State<StubState>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        headers,
        body: serde_json::from_str(&body).unwrap_or(serde_json::Value::Null),
    });
    state
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((StatusCode::GONE, "no reply scripted".into()))
}

/// An address nothing listens on.
pub fn closed_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
