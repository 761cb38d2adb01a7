//! Guest live-dashboard session.
//!
//! Drives the impact counters, donation ticker, and impact timeline
//! shown to anonymous visitors: one initial fetch per feed, then
//! push-driven deltas merged through the [`DashboardStore`] reducers.
//! The push channel is supervised (see `setu_net::socket`), so a
//! dropped socket recovers without remounting the view.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use setu_net::{guest_session_key, spawn_push_listener, ApiClient, PushNotification};
use setu_shared::protocol::PushEvent;
use setu_shared::types::{Counter, Donation, ImpactEvent};

use crate::config::SyncConfig;
use crate::events::{emit, SyncEvent};
use crate::store::DashboardStore;

pub struct LiveDashboard {
    api: Arc<ApiClient>,
    store: Arc<Mutex<DashboardStore>>,
    events: broadcast::Sender<SyncEvent>,
    cancel: CancellationToken,
    config: SyncConfig,
}

impl LiveDashboard {
    pub fn new(config: SyncConfig) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            api: Arc::new(ApiClient::new(config.base_url.clone())),
            store: Arc::new(Mutex::new(DashboardStore::new(config.feed_cap))),
            events,
            cancel: CancellationToken::new(),
            config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Fetch the initial snapshots, then attach the push listener.
    ///
    /// A failed initial fetch leaves that feed empty until a push
    /// arrives; the listener starts regardless.
    pub async fn start(&self) {
        self.fetch_initial().await;

        let mut notifications = spawn_push_listener(
            self.config.ws_url.clone(),
            guest_session_key(),
            self.config.reconnect.clone(),
            self.cancel.child_token(),
        );

        let store = self.store.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            while let Some(notification) = notifications.recv().await {
                match notification {
                    PushNotification::Connected => {
                        emit(&events, SyncEvent::PushChannel { connected: true });
                    }
                    PushNotification::Disconnected => {
                        emit(&events, SyncEvent::PushChannel { connected: false });
                    }
                    PushNotification::Event(event) => {
                        apply_push_event(&store, &events, event);
                    }
                }
            }
            debug!("Dashboard push bridge stopped");
        });

        info!("Live dashboard started");
    }

    pub async fn shutdown(&self) {
        self.cancel.cancel();
        info!("Live dashboard stopped");
    }

    async fn fetch_initial(&self) {
        match self.api.counters().await {
            Ok(counters) => {
                if let Ok(mut guard) = self.store.lock() {
                    guard.replace_counters(counters);
                }
                emit(&self.events, SyncEvent::CountersUpdated);
            }
            Err(e) => warn!(error = %e, "Initial counter fetch failed"),
        }

        match self.api.donation_ticker(self.config.feed_cap).await {
            Ok(donations) => {
                if let Ok(mut guard) = self.store.lock() {
                    guard.replace_donations(donations);
                }
                emit(&self.events, SyncEvent::FeedUpdated);
            }
            Err(e) => warn!(error = %e, "Initial donation fetch failed"),
        }

        match self.api.timeline(self.config.feed_cap).await {
            Ok(events_list) => {
                if let Ok(mut guard) = self.store.lock() {
                    guard.replace_timeline(events_list);
                }
                emit(&self.events, SyncEvent::FeedUpdated);
            }
            Err(e) => warn!(error = %e, "Initial timeline fetch failed"),
        }
    }

    // -- View accessors (cloned snapshots for rendering) --

    pub fn counters(&self) -> std::collections::HashMap<String, Counter> {
        self.store
            .lock()
            .map(|guard| guard.counters().clone())
            .unwrap_or_default()
    }

    pub fn donations(&self) -> Vec<Donation> {
        self.store
            .lock()
            .map(|guard| guard.donations().to_vec())
            .unwrap_or_default()
    }

    pub fn timeline(&self) -> Vec<ImpactEvent> {
        self.store
            .lock()
            .map(|guard| guard.timeline().to_vec())
            .unwrap_or_default()
    }
}

/// Dispatch one push event through the matching reducer.
fn apply_push_event(
    store: &Arc<Mutex<DashboardStore>>,
    events: &broadcast::Sender<SyncEvent>,
    event: PushEvent,
) {
    match event {
        PushEvent::CounterUpdate {
            counter_name,
            value,
        } => {
            let applied = match store.lock() {
                Ok(mut guard) => guard.apply_counter_update(&counter_name, value, Utc::now()),
                Err(_) => false,
            };
            if applied {
                emit(events, SyncEvent::CountersUpdated);
            }
        }
        PushEvent::NewDonation { donation } => {
            let applied = match store.lock() {
                Ok(mut guard) => guard.push_donation(donation),
                Err(_) => false,
            };
            if applied {
                emit(events, SyncEvent::FeedUpdated);
            }
        }
        PushEvent::NewImpactEvent { event } => {
            let applied = match store.lock() {
                Ok(mut guard) => guard.push_timeline_event(event),
                Err(_) => false,
            };
            if applied {
                emit(events, SyncEvent::FeedUpdated);
            }
        }
        // Conversation events are not meaningful on the guest dashboard.
        PushEvent::Typing { .. } | PushEvent::Pong => {
            debug!("Ignoring non-dashboard push event");
        }
    }
}
