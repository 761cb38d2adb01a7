//! Supervised WebSocket push listener.
//!
//! The listener runs in a dedicated tokio task and forwards parsed
//! push events to the application over a typed notification channel,
//! keeping the networking layer fully asynchronous and decoupled.
//! When the socket closes or errors it re-dials the same logical
//! channel with capped exponential backoff; the task ends only when
//! its [`CancellationToken`] fires.

use futures::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsFrame;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use setu_shared::protocol::PushEvent;

use crate::backoff::{next_delay, with_jitter, ReconnectConfig};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Notifications sent from the listener task to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum PushNotification {
    /// The socket is open and receiving.
    Connected,
    /// The socket dropped; a reconnect attempt is scheduled.
    Disconnected,
    /// A recognised push event arrived.
    Event(PushEvent),
}

/// Generate an ephemeral session key for an anonymous dashboard view.
pub fn guest_session_key() -> String {
    format!("guest-{}", uuid::Uuid::new_v4())
}

/// Spawn the push listener task.
///
/// Connects to `{ws_url}/ws/{session_key}` and keeps the connection
/// alive for the lifetime of the `cancel` token. Returns the receiving
/// half of the notification channel; the channel closes when the task
/// exits.
pub fn spawn_push_listener(
    ws_url: String,
    session_key: String,
    config: ReconnectConfig,
    cancel: CancellationToken,
) -> mpsc::Receiver<PushNotification> {
    let (notif_tx, notif_rx) = mpsc::channel::<PushNotification>(256);

    tokio::spawn(async move {
        let url = format!("{ws_url}/ws/{session_key}");
        let mut delay = config.initial_delay;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = connect_async(&url) => match result {
                    Ok((stream, _response)) => {
                        info!(session = %session_key, attempt, "Push channel connected");
                        attempt = 0;
                        delay = config.initial_delay;

                        if notif_tx.send(PushNotification::Connected).await.is_err() {
                            break;
                        }

                        read_frames(stream, &notif_tx, &cancel).await;

                        if cancel.is_cancelled() {
                            break;
                        }
                        warn!(session = %session_key, "Push channel dropped");
                        if notif_tx.send(PushNotification::Disconnected).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(session = %session_key, attempt, error = %e, "Push channel connect failed");
                    }
                }
            }

            // Back off before re-dialing unless shutdown wins first.
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(with_jitter(delay, &config)) => {}
            }
            delay = next_delay(delay, &config);
        }

        info!(session = %session_key, "Push listener stopped");
    });

    notif_rx
}

/// Read frames until the socket closes, errors, or the token fires.
async fn read_frames(
    mut stream: WsStream,
    notif_tx: &mpsc::Sender<PushNotification>,
    cancel: &CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            frame = stream.next() => match frame {
                Some(Ok(WsFrame::Text(text))) => match PushEvent::parse(&text) {
                    Ok(Some(event)) => {
                        if notif_tx.send(PushNotification::Event(event)).await.is_err() {
                            return;
                        }
                    }
                    Ok(None) => {
                        debug!("Ignoring unrecognised push event type");
                    }
                    Err(e) => {
                        debug!(error = %e, "Dropping malformed push frame");
                    }
                },
                // Control frames carry no application payload.
                Some(Ok(WsFrame::Ping(_) | WsFrame::Pong(_) | WsFrame::Binary(_) | WsFrame::Frame(_))) => {}
                Some(Ok(WsFrame::Close(_))) | None => return,
                Some(Err(e)) => {
                    warn!(error = %e, "Push channel read error");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use futures::SinkExt;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    fn fast_config() -> ReconnectConfig {
        ReconnectConfig {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            multiplier: 2.0,
            jitter: 0.0,
        }
    }

    fn counter_frame(value: u32) -> String {
        format!(r#"{{"type": "counter_update", "counter_name": "total_volunteers", "value": {value}}}"#)
    }

    async fn next_notification(
        rx: &mut mpsc::Receiver<PushNotification>,
    ) -> PushNotification {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for notification")
            .expect("listener channel closed")
    }

    #[test]
    fn guest_session_keys_are_unique() {
        let a = guest_session_key();
        let b = guest_session_key();
        assert!(a.starts_with("guest-"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn receives_events_and_reconnects_after_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            // First connection: one event, then a server-side close.
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            ws.send(WsFrame::Text(counter_frame(1))).await.unwrap();
            ws.close(None).await.unwrap();

            // Second connection: the listener should come back on its own.
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            ws.send(WsFrame::Text(counter_frame(2))).await.unwrap();
            // Hold the socket open until the client goes away.
            while ws.next().await.is_some() {}
        });

        let cancel = CancellationToken::new();
        let mut rx = spawn_push_listener(
            format!("ws://{addr}"),
            "guest-test".to_string(),
            fast_config(),
            cancel.clone(),
        );

        assert_eq!(next_notification(&mut rx).await, PushNotification::Connected);
        assert!(matches!(
            next_notification(&mut rx).await,
            PushNotification::Event(PushEvent::CounterUpdate { value, .. }) if value == 1.0
        ));
        assert_eq!(
            next_notification(&mut rx).await,
            PushNotification::Disconnected
        );
        assert_eq!(next_notification(&mut rx).await, PushNotification::Connected);
        assert!(matches!(
            next_notification(&mut rx).await,
            PushNotification::Event(PushEvent::CounterUpdate { value, .. }) if value == 2.0
        ));

        cancel.cancel();
    }

    #[tokio::test]
    async fn unknown_event_types_are_not_forwarded() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            ws.send(WsFrame::Text(r#"{"type": "heatmap_update"}"#.to_string()))
                .await
                .unwrap();
            ws.send(WsFrame::Text(counter_frame(3))).await.unwrap();
            while ws.next().await.is_some() {}
        });

        let cancel = CancellationToken::new();
        let mut rx = spawn_push_listener(
            format!("ws://{addr}"),
            guest_session_key(),
            fast_config(),
            cancel.clone(),
        );

        assert_eq!(next_notification(&mut rx).await, PushNotification::Connected);
        // The unknown frame is skipped; the counter arrives next.
        assert!(matches!(
            next_notification(&mut rx).await,
            PushNotification::Event(PushEvent::CounterUpdate { value, .. }) if value == 3.0
        ));

        cancel.cancel();
    }

    #[tokio::test]
    async fn cancellation_stops_the_listener() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut rx = spawn_push_listener(
            "ws://127.0.0.1:9".to_string(),
            guest_session_key(),
            fast_config(),
            cancel,
        );

        // Task exits without connecting; the channel closes.
        let closed = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for listener shutdown");
        assert!(closed.is_none());
    }
}
