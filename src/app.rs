use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use crate::add_content::{AddContentFlow, UiEvent};
use crate::api::MusicApi;
use crate::config::Config;
use crate::controls::PlayerControls;
use crate::playlists::PlaylistPane;
use crate::status_sync::{shared_state, SharedPlayerState, StatusPoller};

/// Everything the shell needs for one active player view. Created on mount,
/// shut down on unmount; the poller dies with the session, so no timer can
/// outlive the view that owns it.
pub struct PlayerSession {
    pub api: Arc<MusicApi>,
    pub state: SharedPlayerState,
    pub controls: PlayerControls,
    pub add_flow: AddContentFlow,
    pub playlists: PlaylistPane,
    pub events: UnboundedReceiver<UiEvent>,
    poller: StatusPoller,
}

impl PlayerSession {
    pub fn start(config: &Config) -> Self {
        let api = Arc::new(MusicApi::new(&config.api_base_url, config.request_timeout));
        let state = shared_state();
        let poller = StatusPoller::spawn(Arc::clone(&api), Arc::clone(&state), config.poll_interval);

        let (events_tx, events_rx) = unbounded_channel();
        let controls = PlayerControls::new(Arc::clone(&api), Arc::clone(&state), config.seek_grace);
        let add_flow = AddContentFlow::new(Arc::clone(&api), config.progress_ws_url.clone(), events_tx);
        let playlists = PlaylistPane::new(Arc::clone(&api));

        Self {
            api,
            state,
            controls,
            add_flow,
            playlists,
            events: events_rx,
            poller,
        }
    }

    pub async fn shutdown(self) {
        self.poller.join().await;
    }
}
