use log::debug;
use std::sync::Arc;
use std::time::Duration;

use crate::api::MusicApi;
use crate::optimistic::OptimisticField;
use crate::status_sync::{refresh_once, SharedPlayerState};
use crate::types::{StatusSnapshot, ToggleFlags};

const SKIP_SECONDS: f64 = 10.0;

/// Player-bar view state: transport commands plus the two scrubbable
/// controls (seek, volume) with their optimistic overrides.
///
/// Commands are fire-and-forget: a failed toggle or seek is logged and left
/// for the next poll to reconcile, never retried or surfaced.
pub struct PlayerControls {
    api: Arc<MusicApi>,
    state: SharedPlayerState,
    seek: OptimisticField<f64>,
    volume: OptimisticField<f64>,
}

impl PlayerControls {
    pub fn new(api: Arc<MusicApi>, state: SharedPlayerState, grace: Duration) -> Self {
        Self {
            api,
            state,
            seek: OptimisticField::new(grace),
            volume: OptimisticField::new(grace),
        }
    }

    // Render-time merge rule: optimistic value while an edit is active,
    // polled value otherwise. Evaluated against whatever snapshot the caller
    // is rendering, so a newly begun drag overrides even a poll in flight.

    pub fn position_secs(&self, snapshot: &StatusSnapshot) -> f64 {
        self.seek.value(snapshot.position as f64 / 1000.0)
    }

    pub fn duration_secs(&self, snapshot: &StatusSnapshot) -> f64 {
        snapshot.duration as f64 / 1000.0
    }

    pub fn volume_level(&self, snapshot: &StatusSnapshot) -> f64 {
        self.volume.value(snapshot.volume)
    }

    pub fn elapsed_label(&self, snapshot: &StatusSnapshot) -> String {
        format_time(self.position_secs(snapshot))
    }

    pub fn duration_label(&self, snapshot: &StatusSnapshot) -> String {
        format_time(self.duration_secs(snapshot))
    }

    // Seek slider

    pub async fn begin_seek(&mut self) {
        let current = {
            let state = self.state.lock().await;
            state
                .snapshot
                .as_ref()
                .map(|s| s.position as f64 / 1000.0)
                .unwrap_or(0.0)
        };
        self.seek.begin(current);
    }

    pub fn drag_seek(&mut self, position_secs: f64) {
        self.seek.update(position_secs);
    }

    pub fn end_seek(&mut self) {
        if let Some(position) = self.seek.commit() {
            let api = Arc::clone(&self.api);
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                if let Err(e) = api.seek(position).await {
                    // Superseded by the next poll, not retried.
                    debug!("Seek command failed: {}", e);
                }
                refresh_once(&api, &state).await;
            });
        }
    }

    // Volume slider

    pub async fn begin_volume(&mut self) {
        let current = {
            let state = self.state.lock().await;
            state.snapshot.as_ref().map(|s| s.volume).unwrap_or(0.5)
        };
        self.volume.begin(current);
    }

    pub fn drag_volume(&mut self, volume: f64) {
        self.volume.update(volume);
    }

    pub fn end_volume(&mut self) {
        if let Some(volume) = self.volume.commit() {
            let api = Arc::clone(&self.api);
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                if let Err(e) = api.set_volume(volume).await {
                    debug!("Volume command failed: {}", e);
                }
                refresh_once(&api, &state).await;
            });
        }
    }

    // Transport commands

    pub async fn toggle_play_pause(&self) {
        if let Err(e) = self.api.toggle_pause().await {
            debug!("Pause toggle failed: {}", e);
        }
        refresh_once(&self.api, &self.state).await;
    }

    pub async fn next_song(&self) {
        if let Err(e) = self.api.next_song().await {
            debug!("Next command failed: {}", e);
        }
        refresh_once(&self.api, &self.state).await;
    }

    pub async fn previous_song(&self) {
        if let Err(e) = self.api.previous_song().await {
            debug!("Previous command failed: {}", e);
        }
        refresh_once(&self.api, &self.state).await;
    }

    pub async fn skip_forward(&self) {
        let position = self.polled_position_secs().await;
        if let Err(e) = self.api.seek(position + SKIP_SECONDS).await {
            debug!("Skip forward failed: {}", e);
        }
        refresh_once(&self.api, &self.state).await;
    }

    pub async fn skip_backward(&self) {
        let position = self.polled_position_secs().await;
        if let Err(e) = self.api.seek((position - SKIP_SECONDS).max(0.0)).await {
            debug!("Skip backward failed: {}", e);
        }
        refresh_once(&self.api, &self.state).await;
    }

    /// Returns the mutated flags for immediate rendering; `None` on failure
    /// (the next poll settles it either way).
    pub async fn toggle_shuffle(&self) -> Option<ToggleFlags> {
        match self.api.toggle_shuffle().await {
            Ok(flags) => Some(flags),
            Err(e) => {
                debug!("Shuffle toggle failed: {}", e);
                None
            }
        }
    }

    pub async fn toggle_repeat(&self) -> Option<ToggleFlags> {
        match self.api.toggle_repeat().await {
            Ok(flags) => Some(flags),
            Err(e) => {
                debug!("Repeat toggle failed: {}", e);
                None
            }
        }
    }

    pub async fn toggle_mute(&self) -> Option<bool> {
        let result = self.api.toggle_mute().await;
        refresh_once(&self.api, &self.state).await;
        match result {
            Ok(mute) => Some(mute.is_muted),
            Err(e) => {
                debug!("Mute toggle failed: {}", e);
                None
            }
        }
    }

    async fn polled_position_secs(&self) -> f64 {
        let state = self.state.lock().await;
        state
            .snapshot
            .as_ref()
            .map(|s| s.position as f64 / 1000.0)
            .unwrap_or(0.0)
    }
}

/// `m:ss`, minutes unpadded, matching the player bar labels.
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
