pub mod client;
pub mod error;
pub mod frame;
pub mod prompt;

pub use client::{ChatStream, GenaiLlmClient, LlmClient, MockLlmClient, StreamEvent};
pub use error::LlmError;
pub use frame::{FrameEvent, FrameExtractor};
