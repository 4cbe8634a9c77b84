use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::MusicApi;
use crate::types::StatusSnapshot;

/// Canonical UI-facing player state. Single writer (the poller and the
/// explicit refresh path), any number of readers.
#[derive(Debug, Default)]
pub struct PlayerState {
    pub snapshot: Option<StatusSnapshot>,
    pub backend_unreachable: bool,
}

impl PlayerState {
    pub fn apply(&mut self, snapshot: StatusSnapshot) {
        self.snapshot = Some(snapshot);
        self.backend_unreachable = false;
    }

    /// The last snapshot stays available while the backend is unreachable so
    /// the UI can keep rendering stale-but-known state behind the banner.
    pub fn mark_unreachable(&mut self) {
        self.backend_unreachable = true;
    }
}

pub type SharedPlayerState = Arc<Mutex<PlayerState>>;

pub fn shared_state() -> SharedPlayerState {
    Arc::new(Mutex::new(PlayerState::default()))
}

/// One immediate status query outside the poll cadence, used right after a
/// command is dispatched.
pub async fn refresh_once(api: &MusicApi, state: &SharedPlayerState) {
    match api.status().await {
        Ok(snapshot) => state.lock().await.apply(snapshot),
        Err(e) => {
            debug!("Status refresh failed: {}", e);
            state.lock().await.mark_unreachable();
        }
    }
}

/// Fixed-cadence reconciliation loop. One request per tick, awaited inline,
/// so polls can never overlap; ticks that come due mid-request are skipped,
/// not queued. Lives exactly as long as the owning view: dropping or
/// shutting down the poller cancels the loop and no timer survives it.
pub struct StatusPoller {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl StatusPoller {
    pub fn spawn(api: Arc<MusicApi>, state: SharedPlayerState, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let result = api.status().await;
                if token.is_cancelled() {
                    // The view tore down while the request was in flight;
                    // the result is stale and must not be applied.
                    break;
                }

                let mut state = state.lock().await;
                match result {
                    Ok(snapshot) => state.apply(snapshot),
                    Err(e) => {
                        debug!("Status poll failed: {}", e);
                        state.mark_unreachable();
                    }
                }
            }
            debug!("Status poller stopped");
        });

        Self { cancel, task }
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub async fn join(mut self) {
        self.cancel.cancel();
        let _ = (&mut self.task).await;
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
