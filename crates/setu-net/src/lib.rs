// Network layer: REST client for the Seva-Setu backend and the
// supervised WebSocket push listener.

pub mod api;
pub mod backoff;
pub mod error;
pub mod socket;

pub use api::{ApiClient, NewMessage};
pub use backoff::ReconnectConfig;
pub use error::NetError;
pub use socket::{guest_session_key, spawn_push_listener, PushNotification};
