//! # setu-sync
//!
//! Client-side realtime synchronization for Seva-Setu views.
//!
//! The backend owns all authoritative state; this crate keeps
//! in-memory view projections eventually consistent with it through
//! fixed-interval polling, a supervised WebSocket push channel, and
//! optimistic application of acknowledged mutations. Each view is a
//! session object owning its tasks, all bound to cancellation tokens
//! so nothing can touch view state after the view goes away.

pub mod chat;
pub mod config;
pub mod events;
pub mod live;
pub mod poller;
pub mod presence;
pub mod store;
pub mod typing;

use tracing_subscriber::{fmt, EnvFilter};

pub use chat::ChatSession;
pub use config::SyncConfig;
pub use events::SyncEvent;
pub use live::LiveDashboard;

/// Initialise tracing for a host binary.
///
/// Respects `RUST_LOG` when set, otherwise defaults to debug output
/// for the sync crates and warnings for everything else.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("setu_sync=debug,setu_net=debug,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
