use futures_util::StreamExt;
use log::{debug, info, warn};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::types::{OperationOutcome, ProgressEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    Connecting,
    Streaming,
    Completed,
    Failed,
    Disconnected,
}

/// Wire frames on the progress channel. One terminal frame ends the
/// operation; everything before it is incremental progress.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ProgressFrame {
    Progress(ProgressEvent),
    Complete { message: String },
    Error { message: String },
}

/// One WebSocket connection for one bulk operation.
///
/// The terminal callback fires exactly once across every exit path: natural
/// completion, server-side error frame, transport error, or the transport
/// closing before a terminal frame. A caller-initiated [`disconnect`] is the
/// one exception: the caller is tearing down and has already settled its own
/// UI, so no callback fires and buffered frames are dropped unread.
///
/// [`disconnect`]: ProgressStream::disconnect
pub struct ProgressStream {
    url: String,
    op_id: Uuid,
    phase: Arc<Mutex<StreamPhase>>,
    cancel: CancellationToken,
}

impl ProgressStream {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            op_id: Uuid::new_v4(),
            phase: Arc::new(Mutex::new(StreamPhase::Idle)),
            cancel: CancellationToken::new(),
        }
    }

    pub fn op_id(&self) -> Uuid {
        self.op_id
    }

    pub async fn phase(&self) -> StreamPhase {
        *self.phase.lock().await
    }

    /// Idempotent; safe from any state, including after natural completion.
    pub fn disconnect(&self) {
        self.cancel.cancel();
    }

    pub async fn connect<F, C>(&self, on_progress: F, on_complete: C)
    where
        F: Fn(ProgressEvent) + Send + 'static,
        C: FnOnce(OperationOutcome) + Send + 'static,
    {
        {
            let mut phase = self.phase.lock().await;
            if *phase != StreamPhase::Idle {
                warn!("Progress stream {} connected twice; ignoring", self.op_id);
                return;
            }
            *phase = StreamPhase::Connecting;
        }

        let url = self.url.clone();
        let op_id = self.op_id;
        let phase = Arc::clone(&self.phase);
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            // Taking from this slot is what makes the terminal callback
            // single-shot; every exit path below goes through it.
            let mut terminal: Option<C> = Some(on_complete);

            let connected = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    *phase.lock().await = StreamPhase::Disconnected;
                    return;
                }
                result = connect_async(url.as_str()) => result,
            };

            let mut ws = match connected {
                Ok((ws, _)) => ws,
                Err(e) => {
                    warn!("Progress stream {} failed to connect: {}", op_id, e);
                    *phase.lock().await = StreamPhase::Failed;
                    if let Some(callback) = terminal.take() {
                        callback(OperationOutcome::Failed {
                            reason: format!("Progress channel connect failed: {}", e),
                        });
                    }
                    return;
                }
            };

            info!("Progress stream {} connected to {}", op_id, url);
            *phase.lock().await = StreamPhase::Streaming;

            loop {
                let message = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("Progress stream {} disconnected by caller", op_id);
                        *phase.lock().await = StreamPhase::Disconnected;
                        let _ = ws.close(None).await;
                        return;
                    }
                    message = ws.next() => message,
                };

                match message {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str::<ProgressFrame>(&text) {
                        Ok(ProgressFrame::Progress(event)) => {
                            debug!(
                                "Progress stream {}: {}/{}",
                                op_id, event.current, event.total
                            );
                            on_progress(event);
                        }
                        Ok(ProgressFrame::Complete { message }) => {
                            info!("Progress stream {} completed: {}", op_id, message);
                            *phase.lock().await = StreamPhase::Completed;
                            if let Some(callback) = terminal.take() {
                                callback(OperationOutcome::Completed { message });
                            }
                            // Happy path: the client owns closing the socket.
                            let _ = ws.close(None).await;
                            return;
                        }
                        Ok(ProgressFrame::Error { message }) => {
                            warn!("Progress stream {} reported failure: {}", op_id, message);
                            *phase.lock().await = StreamPhase::Failed;
                            if let Some(callback) = terminal.take() {
                                callback(OperationOutcome::Failed { reason: message });
                            }
                            let _ = ws.close(None).await;
                            return;
                        }
                        Err(e) => {
                            warn!("Progress stream {}: unparseable frame: {}", op_id, e);
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        // The server went away without a terminal frame; the
                        // caller's loading UI must still be released.
                        warn!("Progress stream {} closed before completion", op_id);
                        *phase.lock().await = StreamPhase::Failed;
                        if let Some(callback) = terminal.take() {
                            callback(OperationOutcome::Failed {
                                reason: "Progress channel closed before completion".to_string(),
                            });
                        }
                        return;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Progress stream {} transport error: {}", op_id, e);
                        *phase.lock().await = StreamPhase::Failed;
                        if let Some(callback) = terminal.take() {
                            callback(OperationOutcome::Failed {
                                reason: format!("Progress channel error: {}", e),
                            });
                        }
                        return;
                    }
                }
            }
        });
    }
}
