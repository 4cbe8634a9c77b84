use anyhow::{Context, Result};
use log::{info, warn};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::timeout;

use crate::api::MusicApi;

/// Supervisor for the spawned backend process. On quit the backend is asked
/// to stop playback gracefully within a bounded wait; only if it is still
/// alive afterwards does it get killed.
pub struct BackendProcess {
    child: Child,
}

impl BackendProcess {
    pub fn spawn(program: &str, args: &[&str]) -> Result<Self> {
        let child = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn backend process {}", program))?;
        info!("Backend process started (pid {:?})", child.id());
        Ok(Self { child })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub async fn stop(mut self, api: &MusicApi, grace: Duration) -> Result<()> {
        match timeout(grace, api.stop()).await {
            Ok(Ok(())) => info!("Backend acknowledged stop"),
            Ok(Err(e)) => warn!("Backend stop request failed: {}", e),
            Err(_) => warn!("Backend stop request timed out after {:?}", grace),
        }

        match timeout(grace, self.child.wait()).await {
            Ok(status) => {
                let status = status.context("waiting for backend exit")?;
                info!("Backend exited: {}", status);
            }
            Err(_) => {
                warn!("Backend still alive after {:?}, killing", grace);
                self.child.kill().await.context("killing backend process")?;
            }
        }
        Ok(())
    }
}
