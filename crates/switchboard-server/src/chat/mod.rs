pub mod engine;
pub mod events;
pub mod handler;
pub mod orders;

pub use events::ChatEvent;
pub use handler::{chat_stream_handler, chat_stream_preflight};
