//! Best-effort presence announcements.
//!
//! Reported on session start and shutdown. Failures are swallowed;
//! there is no retry and no heartbeat, so presence can go stale until
//! the server-side timeout if the process dies abruptly.

use std::sync::Arc;

use tracing::debug;

use setu_net::ApiClient;
use setu_shared::types::PresenceStatus;

#[derive(Debug, Clone)]
pub struct PresenceReporter {
    api: Arc<ApiClient>,
}

impl PresenceReporter {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Announce a status change; errors are logged and dropped.
    pub async fn report(&self, status: PresenceStatus) {
        if let Err(e) = self.api.update_presence(status).await {
            debug!(status = %status, error = %e, "Presence report failed");
        }
    }
}
