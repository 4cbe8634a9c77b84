use log::info;

// Module declarations
pub mod add_content;
pub mod api;
pub mod app;
pub mod config;
pub mod controls;
pub mod optimistic;
pub mod playlists;
pub mod progress;
pub mod shutdown;
pub mod status_sync;
pub mod types;

#[cfg(test)]
mod test_support;

pub use add_content::{AddContentFlow, UiEvent};
pub use api::MusicApi;
pub use app::PlayerSession;
pub use config::Config;
pub use controls::{format_time, PlayerControls};
pub use optimistic::OptimisticField;
pub use playlists::PlaylistPane;
pub use progress::{ProgressStream, StreamPhase};
pub use shutdown::BackendProcess;
pub use status_sync::{refresh_once, PlayerState, SharedPlayerState, StatusPoller};
pub use types::{
    CacheStats, OperationOutcome, PlaylistSummary, ProgressEvent, RefreshStats, Song, SongRef,
    StatusSnapshot, ToggleFlags,
};

/// Called once by the host shell before anything else.
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .init();

    info!("Resona core initialized");
}
