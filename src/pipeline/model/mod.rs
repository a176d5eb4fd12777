pub mod types;
pub mod gemini;
pub mod openai;
pub mod registry;
#[cfg(test)]
pub mod mock;

pub use types::*;
pub use gemini::GeminiModel;
pub use openai::OpenAiModel;
pub use registry::{ModelConstructor, ModelRegistry};
#[cfg(test)]
pub use mock::MockTextModel;
