use log::{debug, warn};
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::api::MusicApi;
use crate::progress::ProgressStream;
use crate::types::{OperationOutcome, PlaylistSummary, ProgressEvent};

const GETTING_INFO: &str = "Getting playlist info...";
const ADDING_SONG: &str = "Adding song to playlist...";
const CREATING_PLAYLIST: &str = "Creating new playlist...";
const INVALID_URL: &str = "Invalid YouTube URL. Please enter a valid YouTube video link.";
const GENERIC_ADD_ERROR: &str = "Error adding content. Please try again.";

/// Everything the host shell needs to render while a flow runs. Delivered on
/// an unbounded channel; the shell drains it on its own cadence.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    LoadingStarted { message: String },
    Progress(ProgressEvent),
    LoadingFinished,
    Message(String),
    Popup(String),
    PlaylistsChanged,
    PlacementPrompt { playlists: Vec<(String, PlaylistSummary)> },
}

/// Per-invocation guard making the loading enter/exit pair single-shot, no
/// matter which branch (or how many racing callbacks) tries to settle it.
struct LoadingGate {
    events: UnboundedSender<UiEvent>,
    entered: AtomicBool,
    exited: AtomicBool,
}

impl LoadingGate {
    fn new(events: UnboundedSender<UiEvent>) -> Self {
        Self {
            events,
            entered: AtomicBool::new(false),
            exited: AtomicBool::new(false),
        }
    }

    fn enter(&self, message: &str) {
        if !self.entered.swap(true, Ordering::SeqCst) {
            let _ = self.events.send(UiEvent::LoadingStarted {
                message: message.to_string(),
            });
        }
    }

    fn exit(&self) {
        if self.entered.load(Ordering::SeqCst) && !self.exited.swap(true, Ordering::SeqCst) {
            let _ = self.events.send(UiEvent::LoadingFinished);
        }
    }
}

/// Drives "add playlist/song by URL" end to end: request, progress stream,
/// terminal outcome, and teardown on every exit path.
pub struct AddContentFlow {
    api: Arc<MusicApi>,
    progress_url: String,
    events: UnboundedSender<UiEvent>,
}

impl AddContentFlow {
    pub fn new(api: Arc<MusicApi>, progress_url: impl Into<String>, events: UnboundedSender<UiEvent>) -> Self {
        Self {
            api,
            progress_url: progress_url.into(),
            events,
        }
    }

    pub async fn add_content(&self, url: &str) {
        let url = url.trim();
        if url.is_empty() {
            return;
        }

        let gate = Arc::new(LoadingGate::new(self.events.clone()));
        gate.enter(GETTING_INFO);

        if url.contains("list=") {
            self.add_playlist_with_progress(url, &gate).await;
        } else if extract_video_id(url).is_none() {
            self.send(UiEvent::Message(INVALID_URL.to_string()));
            gate.exit();
        } else {
            // Valid single song: prompt for placement instead of
            // auto-committing anywhere.
            match self.api.playlists().await {
                Ok(playlists) => {
                    let mut local: Vec<(String, PlaylistSummary)> = playlists
                        .into_iter()
                        .filter(|(_, playlist)| playlist.source_url.is_none())
                        .collect();
                    local.sort_by(|a, b| a.1.name.cmp(&b.1.name));
                    gate.exit();
                    self.send(UiEvent::PlacementPrompt { playlists: local });
                }
                Err(e) => {
                    warn!("Loading playlists for placement failed: {}", e);
                    self.send(UiEvent::Message(GENERIC_ADD_ERROR.to_string()));
                    gate.exit();
                }
            }
        }
    }

    async fn add_playlist_with_progress(&self, url: &str, gate: &Arc<LoadingGate>) {
        // Stream first, then the add request, so no early progress is missed.
        let stream = ProgressStream::new(&self.progress_url);
        debug!("Bulk add {} started for {}", stream.op_id(), url);

        let progress_events = self.events.clone();
        let terminal_events = self.events.clone();
        let terminal_gate = Arc::clone(gate);
        stream
            .connect(
                move |event| {
                    let _ = progress_events.send(UiEvent::Progress(event));
                },
                move |outcome| settle(&terminal_events, &terminal_gate, outcome),
            )
            .await;

        match self.api.add_playlist(url).await {
            Ok(response) if response.exists => {
                // Duplicate: the stream's completion path must not get a
                // chance to double-fire the loading exit.
                stream.disconnect();
                settle(&self.events, gate, OperationOutcome::AlreadyExists);
            }
            Ok(_) => {
                // The terminal frame on the progress stream owns the exit.
            }
            Err(e) => {
                stream.disconnect();
                settle(&self.events, gate, OperationOutcome::Failed { reason: e });
            }
        }
    }

    /// Placement follow-up: add the checked song to an existing local
    /// playlist.
    pub async fn add_to_existing(&self, url: &str, playlist_id: &str) {
        let gate = LoadingGate::new(self.events.clone());
        gate.enter(ADDING_SONG);

        match self.api.check_song(url, Some(playlist_id)).await {
            Ok(check) if check.exists => {
                self.send(UiEvent::Popup("Song already exists in playlist!".to_string()));
            }
            Ok(_) => match self.api.add_song(url, Some(playlist_id), None).await {
                Ok(()) => self.send(UiEvent::Message("Song added to playlist!".to_string())),
                Err(e) => {
                    warn!("Adding song failed: {}", e);
                    self.send(UiEvent::Message(format!("Error adding song: {}", e)));
                }
            },
            Err(e) => {
                warn!("Song check failed: {}", e);
                self.send(UiEvent::Message(format!("Error adding song: {}", e)));
            }
        }
        gate.exit();
    }

    /// Placement follow-up: create a new playlist holding the song.
    pub async fn create_with_new(&self, url: &str, playlist_name: &str) {
        let gate = LoadingGate::new(self.events.clone());
        gate.enter(CREATING_PLAYLIST);

        match self.api.add_song(url, None, Some(playlist_name)).await {
            Ok(()) => {
                self.send(UiEvent::Message("New playlist created with song!".to_string()));
                self.send(UiEvent::PlaylistsChanged);
            }
            Err(e) => {
                warn!("Creating playlist failed: {}", e);
                self.send(UiEvent::Message(format!("Error creating playlist: {}", e)));
            }
        }
        gate.exit();
    }

    fn send(&self, event: UiEvent) {
        let _ = self.events.send(event);
    }
}

fn settle(events: &UnboundedSender<UiEvent>, gate: &LoadingGate, outcome: OperationOutcome) {
    match outcome {
        OperationOutcome::Completed { message } => {
            let _ = events.send(UiEvent::Message(message));
            let _ = events.send(UiEvent::PlaylistsChanged);
        }
        OperationOutcome::AlreadyExists => {
            let _ = events.send(UiEvent::Popup("Playlist already exists!".to_string()));
        }
        OperationOutcome::Failed { reason } => {
            warn!("Bulk add failed: {}", reason);
            let _ = events.send(UiEvent::Message(GENERIC_ADD_ERROR.to_string()));
        }
    }
    gate.exit();
}

pub fn extract_video_id(url: &str) -> Option<String> {
    let re = Regex::new(r"(?:v=|/)([a-zA-Z0-9_-]{11})").ok()?;
    re.captures(url).map(|caps| caps[1].to_string())
}
