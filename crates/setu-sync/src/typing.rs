//! Typing-status burst tracking.
//!
//! The tracker owns a small state machine in its own task: the first
//! keystroke of a burst emits `Started` once, every keystroke pushes
//! the idle deadline out, and deadline expiry emits `Stopped` exactly
//! once, never once per keystroke. Sending a message flushes the
//! burst immediately via [`TypingTracker::stop_now`].

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Signals the session forwards to the typing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingSignal {
    /// The local user started a typing burst.
    Started,
    /// The burst ended (idle timeout or message sent).
    Stopped,
}

#[derive(Debug, Clone, Copy)]
enum Input {
    Key,
    Flush,
}

/// Handle to a spawned typing tracker.
#[derive(Debug, Clone)]
pub struct TypingTracker {
    input_tx: mpsc::Sender<Input>,
}

impl TypingTracker {
    /// Spawn the tracker task; signals come back on the returned
    /// receiver. The task ends when `cancel` fires or the handle is
    /// dropped.
    pub fn spawn(
        idle_timeout: Duration,
        cancel: CancellationToken,
    ) -> (Self, mpsc::Receiver<TypingSignal>) {
        let (input_tx, mut input_rx) = mpsc::channel::<Input>(64);
        let (signal_tx, signal_rx) = mpsc::channel::<TypingSignal>(16);

        tokio::spawn(async move {
            'idle: loop {
                let input = tokio::select! {
                    _ = cancel.cancelled() => break,
                    input = input_rx.recv() => input,
                };
                let Some(input) = input else { break };
                if matches!(input, Input::Flush) {
                    // Nothing to flush while idle.
                    continue;
                }

                if signal_tx.send(TypingSignal::Started).await.is_err() {
                    break;
                }

                let mut deadline = Instant::now() + idle_timeout;
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break 'idle,
                        _ = tokio::time::sleep_until(deadline) => {
                            let _ = signal_tx.send(TypingSignal::Stopped).await;
                            break;
                        }
                        input = input_rx.recv() => match input {
                            Some(Input::Key) => deadline = Instant::now() + idle_timeout,
                            Some(Input::Flush) => {
                                let _ = signal_tx.send(TypingSignal::Stopped).await;
                                break;
                            }
                            None => break 'idle,
                        }
                    }
                }
            }

            debug!("Typing tracker stopped");
        });

        (Self { input_tx }, signal_rx)
    }

    /// Record one keystroke. Non-blocking; drops are harmless since
    /// any queued keystroke already extends the deadline.
    pub fn record_input(&self) {
        let _ = self.input_tx.try_send(Input::Key);
    }

    /// End the current burst immediately (e.g. the message was sent).
    pub fn stop_now(&self) {
        let _ = self.input_tx.try_send(Input::Flush);
    }
}
