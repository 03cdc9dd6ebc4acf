//! Port traits defining external boundaries.
//!
//! Each trait is a boundary between the pipeline and something outside it
//! (time, the generation service). Implementations live in `src/adapters/`.

pub mod clock;
pub mod llm;

pub use clock::Clock;
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmFuture};
