use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One complete read of the backend playback state, replaced wholesale on
/// every poll. Positions and durations are in milliseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatusSnapshot {
    pub is_playing: bool,
    pub is_paused: bool,
    pub is_muted: bool,
    pub is_shuffled: bool,
    pub is_repeated: bool,
    pub position: u64,
    pub duration: u64,
    pub volume: f64,
    pub current_song: Option<SongRef>,
    pub current_playlist_id: Option<String>,
    pub current_song_index: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SongRef {
    pub title: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
}

/// A `source_url` marks the playlist as externally sourced (refreshable);
/// without one it is a local, user-created playlist.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaylistSummary {
    pub name: String,
    pub source_url: Option<String>,
    pub thumbnail: Option<String>,
    pub song_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaylistsResponse {
    pub playlists: HashMap<String, PlaylistSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SongsResponse {
    pub songs: Vec<Song>,
}

/// Shuffle and repeat are mutually constrained server-side, so both toggles
/// report both flags.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToggleFlags {
    pub is_shuffled: bool,
    pub is_repeated: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct MuteState {
    pub is_muted: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddPlaylistResponse {
    pub exists: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct SongCheck {
    pub exists: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RefreshStats {
    pub added: u64,
    pub removed: u64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheStats {
    pub url_cache_count: u64,
    pub metadata_cache_count: u64,
}

/// Incremental progress for one bulk operation. Events arrive in
/// non-decreasing `current` order; that ordering is a server contract and is
/// not re-checked here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProgressEvent {
    pub current: u64,
    pub total: u64,
    pub song_title: Option<String>,
    pub message: Option<String>,
}

/// Terminal result of one bulk operation. Exactly one of these is produced
/// per operation, exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    Completed { message: String },
    AlreadyExists,
    Failed { reason: String },
}
