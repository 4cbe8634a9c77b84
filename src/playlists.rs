use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::MusicApi;
use crate::types::PlaylistSummary;

/// Playlist pane state. The map is replaced wholesale on every load; nothing
/// mutates entries in place.
pub struct PlaylistPane {
    api: Arc<MusicApi>,
    pub playlists: HashMap<String, PlaylistSummary>,
    pub refreshing: Option<String>,
    pub refreshing_all: bool,
    refresh_message: Option<String>,
}

impl PlaylistPane {
    pub fn new(api: Arc<MusicApi>) -> Self {
        Self {
            api,
            playlists: HashMap::new(),
            refreshing: None,
            refreshing_all: false,
            refresh_message: None,
        }
    }

    pub async fn load(&mut self) -> Result<(), String> {
        self.playlists = self.api.playlists().await?;
        Ok(())
    }

    /// Load a playlist into the player without starting playback.
    pub async fn select(&self, playlist_id: &str) -> Result<(), String> {
        self.api.load_playlist(playlist_id, 0).await
    }

    /// Start a playlist from its first song. Preload is best-effort and
    /// playback does not wait on it.
    pub async fn play(&self, playlist_id: &str) {
        let api = Arc::clone(&self.api);
        let id = playlist_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = api.preload_playlist(&id).await {
                debug!("Preload failed for {}: {}", id, e);
            }
        });

        if let Err(e) = self.api.play(playlist_id, 0).await {
            debug!("Play request failed, next poll settles it: {}", e);
        }
    }

    /// Refresh a sourced playlist against its origin. Local playlists have
    /// nothing to refresh against and are skipped.
    pub async fn refresh(&mut self, playlist_id: &str) {
        let sourced = self
            .playlists
            .get(playlist_id)
            .map(|playlist| playlist.source_url.is_some())
            .unwrap_or(false);
        if !sourced || self.refreshing.is_some() {
            return;
        }

        self.refreshing = Some(playlist_id.to_string());
        match self.api.refresh_playlist(playlist_id).await {
            Ok(stats) => {
                if let Err(e) = self.load().await {
                    warn!("Reloading playlists after refresh failed: {}", e);
                }
                self.refresh_message = Some(format!(
                    "Playlist refreshed: {} songs added, {} songs removed",
                    stats.added, stats.removed
                ));
            }
            Err(e) => {
                warn!("Playlist refresh failed: {}", e);
            }
        }
        self.refreshing = None;
    }

    pub async fn delete(&mut self, playlist_id: &str) {
        match self.api.delete_playlist(playlist_id).await {
            Ok(()) => {
                if let Err(e) = self.load().await {
                    warn!("Reloading playlists after delete failed: {}", e);
                }
            }
            Err(e) => warn!("Deleting playlist {} failed: {}", playlist_id, e),
        }
    }

    pub async fn refresh_all(&mut self) {
        if self.refreshing_all {
            return;
        }
        self.refreshing_all = true;
        if let Err(e) = self.load().await {
            warn!("Reloading playlists failed: {}", e);
        }
        self.refreshing_all = false;
    }

    /// One-shot: the shell shows the message once and it is gone.
    pub fn take_refresh_message(&mut self) -> Option<String> {
        self.refresh_message.take()
    }
}
