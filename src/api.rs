use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::types::{
    AddPlaylistResponse, CacheStats, MuteState, PlaylistSummary, PlaylistsResponse, RefreshStats,
    Song, SongCheck, SongsResponse, StatusSnapshot, ToggleFlags,
};

/// Typed client for the backend HTTP surface. One instance is shared across
/// the poller, the controls and the bulk-operation flows.
pub struct MusicApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl MusicApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, String> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP error: {}", response.status()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| format!("JSON parse error: {}", e))
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, String> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP error: {}", response.status()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| format!("JSON parse error: {}", e))
    }

    async fn post_command(&self, path: &str, body: Value) -> Result<(), String> {
        self.post_json::<Value>(path, body).await.map(|_| ())
    }

    // Playback

    pub async fn status(&self) -> Result<StatusSnapshot, String> {
        self.get_json("/status").await
    }

    pub async fn play(&self, playlist_id: &str, song_index: usize) -> Result<(), String> {
        self.post_command(
            "/play",
            serde_json::json!({ "playlist_id": playlist_id, "song_index": song_index }),
        )
        .await
    }

    pub async fn toggle_pause(&self) -> Result<(), String> {
        self.post_command("/pause", serde_json::json!({})).await
    }

    pub async fn next_song(&self) -> Result<(), String> {
        self.post_command("/next", serde_json::json!({})).await
    }

    pub async fn previous_song(&self) -> Result<(), String> {
        self.post_command("/previous", serde_json::json!({})).await
    }

    /// Position is in seconds, matching the backend's seek endpoint (status
    /// reports milliseconds).
    pub async fn seek(&self, position: f64) -> Result<(), String> {
        self.post_command("/seek", serde_json::json!({ "position": position }))
            .await
    }

    pub async fn set_volume(&self, volume: f64) -> Result<(), String> {
        self.post_command("/volume", serde_json::json!({ "volume": volume }))
            .await
    }

    pub async fn toggle_mute(&self) -> Result<MuteState, String> {
        self.post_json("/mute", serde_json::json!({})).await
    }

    pub async fn toggle_shuffle(&self) -> Result<ToggleFlags, String> {
        self.post_json("/shuffle", serde_json::json!({})).await
    }

    pub async fn toggle_repeat(&self) -> Result<ToggleFlags, String> {
        self.post_json("/repeat", serde_json::json!({})).await
    }

    pub async fn stop(&self) -> Result<(), String> {
        self.post_command("/stop", serde_json::json!({})).await
    }

    // Playlists

    pub async fn playlists(&self) -> Result<HashMap<String, PlaylistSummary>, String> {
        let response: PlaylistsResponse = self.get_json("/playlists").await?;
        Ok(response.playlists)
    }

    pub async fn playlist_songs(&self, playlist_id: &str) -> Result<Vec<Song>, String> {
        let response: SongsResponse = self
            .get_json(&format!(
                "/playlist/{}/songs",
                urlencoding::encode(playlist_id)
            ))
            .await?;
        Ok(response.songs)
    }

    pub async fn load_playlist(&self, playlist_id: &str, song_index: usize) -> Result<(), String> {
        self.post_command(
            "/playlist/load",
            serde_json::json!({ "playlist_id": playlist_id, "song_index": song_index }),
        )
        .await
    }

    pub async fn preload_playlist(&self, playlist_id: &str) -> Result<(), String> {
        self.post_command(
            &format!("/playlist/{}/preload", urlencoding::encode(playlist_id)),
            serde_json::json!({}),
        )
        .await
    }

    pub async fn add_playlist(&self, url: &str) -> Result<AddPlaylistResponse, String> {
        self.post_json("/playlist/add", serde_json::json!({ "url": url }))
            .await
    }

    pub async fn refresh_playlist(&self, playlist_id: &str) -> Result<RefreshStats, String> {
        self.post_json(
            &format!("/playlist/{}/refresh", urlencoding::encode(playlist_id)),
            serde_json::json!({}),
        )
        .await
    }

    pub async fn delete_playlist(&self, playlist_id: &str) -> Result<(), String> {
        let url = format!(
            "{}/playlist/{}",
            self.base_url,
            urlencoding::encode(playlist_id)
        );
        debug!("DELETE {}", url);

        let response = self
            .client
            .delete(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP error: {}", response.status()));
        }
        Ok(())
    }

    // Songs

    pub async fn check_song(&self, url: &str, playlist_id: Option<&str>) -> Result<SongCheck, String> {
        self.post_json(
            "/song/check",
            serde_json::json!({ "url": url, "playlist_id": playlist_id }),
        )
        .await
    }

    pub async fn add_song(
        &self,
        url: &str,
        playlist_id: Option<&str>,
        playlist_name: Option<&str>,
    ) -> Result<(), String> {
        self.post_command(
            "/song/add",
            serde_json::json!({
                "url": url,
                "playlist_id": playlist_id,
                "playlist_name": playlist_name
            }),
        )
        .await
    }

    // Caches

    pub async fn cache_stats(&self) -> Result<CacheStats, String> {
        self.get_json("/cache/stats").await
    }

    pub async fn clear_cache(&self) -> Result<(), String> {
        self.post_command("/cache/clear", serde_json::json!({}))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockBackend;

    fn status_body() -> String {
        r#"{"is_playing": true, "is_paused": false, "position": 45000, "duration": 180000,
            "volume": 0.5, "current_song": {"title": "Test"}, "is_muted": false,
            "is_shuffled": false, "is_repeated": false}"#
            .to_string()
    }

    #[tokio::test]
    async fn status_round_trip() {
        let backend = MockBackend::start(Duration::ZERO, |request| {
            assert_eq!(request.path, "/status");
            (200, status_body())
        })
        .await;

        let api = MusicApi::new(backend.base_url(), Duration::from_secs(2));
        let status = api.status().await.unwrap();
        assert!(status.is_playing);
        assert_eq!(status.position, 45000);
    }

    #[tokio::test]
    async fn shuffle_toggle_reports_both_flags() {
        let backend = MockBackend::start(Duration::ZERO, |request| {
            assert_eq!(request.method, "POST");
            assert_eq!(request.path, "/shuffle");
            (200, r#"{"is_shuffled": true, "is_repeated": false}"#.to_string())
        })
        .await;

        let api = MusicApi::new(backend.base_url(), Duration::from_secs(2));
        let flags = api.toggle_shuffle().await.unwrap();
        assert!(flags.is_shuffled);
        assert!(!flags.is_repeated);
    }

    #[tokio::test]
    async fn server_errors_surface_as_http_error_strings() {
        let backend =
            MockBackend::start(Duration::ZERO, |_| (500, r#"{"detail": "boom"}"#.to_string())).await;

        let api = MusicApi::new(backend.base_url(), Duration::from_secs(2));
        let error = api.toggle_pause().await.unwrap_err();
        assert!(error.contains("HTTP error"), "got: {}", error);
    }

    #[tokio::test]
    async fn refresh_parses_added_and_removed_counts() {
        let backend = MockBackend::start(Duration::ZERO, |request| {
            assert_eq!(request.path, "/playlist/pl-1/refresh");
            (200, r#"{"added": 3, "removed": 1}"#.to_string())
        })
        .await;

        let api = MusicApi::new(backend.base_url(), Duration::from_secs(2));
        let stats = api.refresh_playlist("pl-1").await.unwrap();
        assert_eq!(stats, RefreshStats { added: 3, removed: 1 });
    }

    #[tokio::test]
    async fn playlist_songs_unwraps_the_song_list() {
        let backend = MockBackend::start(Duration::ZERO, |request| {
            assert_eq!(request.path, "/playlist/pl%201/songs");
            (
                200,
                r#"{"songs": [{"id": "dQw4w9WgXcQ", "title": "First", "duration": 212.0}]}"#.to_string(),
            )
        })
        .await;

        let api = MusicApi::new(backend.base_url(), Duration::from_secs(2));
        let songs = api.playlist_songs("pl 1").await.unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].title, "First");
    }

    #[tokio::test]
    async fn clear_cache_posts_and_succeeds() {
        let backend = MockBackend::start(Duration::ZERO, |request| {
            assert_eq!(request.method, "POST");
            assert_eq!(request.path, "/cache/clear");
            (200, r#"{"message": "Cleared"}"#.to_string())
        })
        .await;

        let api = MusicApi::new(backend.base_url(), Duration::from_secs(2));
        api.clear_cache().await.unwrap();
    }

    #[tokio::test]
    async fn cache_stats_round_trip() {
        let backend = MockBackend::start(Duration::ZERO, |request| {
            assert_eq!(request.path, "/cache/stats");
            (200, r#"{"url_cache_count": 7, "metadata_cache_count": 42}"#.to_string())
        })
        .await;

        let api = MusicApi::new(backend.base_url(), Duration::from_secs(2));
        let stats = api.cache_stats().await.unwrap();
        assert_eq!(stats.url_cache_count, 7);
        assert_eq!(stats.metadata_cache_count, 42);
    }
}
