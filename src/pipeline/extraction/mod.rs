//! Context-accumulating extraction of action details per segment.

pub mod chain;
pub mod stages;

pub use chain::{ExtractionChain, StageOutputs};
pub use stages::{ExtractionStage, StageSpec, CHAIN};
