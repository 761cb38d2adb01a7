//! # setu-shared
//!
//! Domain types shared across the Seva-Setu client crates.
//!
//! Every type here is a client-side projection of a backend-owned
//! record; the client never holds authoritative state. The crate also
//! defines the push-event wire protocol used on the WebSocket channel
//! and the tuning constants for polling and reconnection.

pub mod constants;
pub mod protocol;
pub mod types;

pub use protocol::PushEvent;
pub use types::*;
