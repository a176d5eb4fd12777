use std::collections::VecDeque;
use std::sync::Mutex;

use super::types::{ModelError, ModelInfo, TextModel};

type Responder = Box<dyn Fn(&str) -> Result<String, ModelError> + Send + Sync>;

enum Behavior {
    Fixed(String),
    Scripted(Mutex<VecDeque<Result<String, ModelError>>>),
    Function(Responder),
}

/// In-process model for unit tests. Records every prompt.
pub struct MockTextModel {
    behavior: Behavior,
    prompts: Mutex<Vec<String>>,
}

impl MockTextModel {
    /// Always answers with `response`.
    pub fn new(response: &str) -> Self {
        Self::with_behavior(Behavior::Fixed(response.to_string()))
    }

    /// Answers with each scripted result in turn; fails once the script runs out.
    pub fn scripted(script: Vec<Result<String, ModelError>>) -> Self {
        Self::with_behavior(Behavior::Scripted(Mutex::new(script.into())))
    }

    /// Answers by calling `f` with the prompt.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<String, ModelError> + Send + Sync + 'static,
    {
        Self::with_behavior(Behavior::Function(Box::new(f)))
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl TextModel for MockTextModel {
    fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());

        match &self.behavior {
            Behavior::Fixed(response) => Ok(response.clone()),
            Behavior::Scripted(script) => script
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front()
                .unwrap_or_else(|| Err(ModelError::MalformedResponse("mock script exhausted".into()))),
            Behavior::Function(f) => f(prompt),
        }
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            provider: "Mock".into(),
            model: "mock".into(),
            description: "In-process scripted model".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_response_and_prompt_recording() {
        let model = MockTextModel::new("ok");
        assert_eq!(model.complete("first").unwrap(), "ok");
        assert_eq!(model.complete("second").unwrap(), "ok");
        assert_eq!(model.call_count(), 2);
        assert_eq!(model.prompts(), vec!["first", "second"]);
    }

    #[test]
    fn scripted_responses_in_order_then_exhausted() {
        let model = MockTextModel::scripted(vec![
            Err(ModelError::RateLimited("wait".into())),
            Ok("done".into()),
        ]);
        assert!(model.complete("p").unwrap_err().is_transient());
        assert_eq!(model.complete("p").unwrap(), "done");
        assert!(matches!(
            model.complete("p"),
            Err(ModelError::MalformedResponse(_))
        ));
    }

    #[test]
    fn function_sees_prompt() {
        let model = MockTextModel::from_fn(|prompt| Ok(prompt.to_uppercase()));
        assert_eq!(model.complete("abc").unwrap(), "ABC");
    }
}
