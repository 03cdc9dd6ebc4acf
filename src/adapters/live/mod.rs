//! Live adapters for real external interactions.

pub mod clock;
pub mod llm;

pub use clock::LiveClock;
pub use llm::LiveLlmClient;
