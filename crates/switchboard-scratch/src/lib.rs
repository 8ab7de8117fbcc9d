//! Per-session conversation scratch store (spec §4.7): holds the last N
//! turns long enough to build the next prompt and emit webhooks. Never a
//! system of record — entries are dropped on TTL expiry or memory pressure.

pub mod key;
pub mod store;

pub use key::{KeyAttributes, SessionKey};
pub use store::{Role, ScratchStore, Turn};
