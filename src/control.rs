//! KioskControl - operations behind the HTTP control surface
//!
//! Handlers call these methods only; they never reach the display client or
//! the scheduler themselves.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::display::{DisplayCommand, RemoteDisplayClient};
use crate::playlist::{
    self, PlayItem, PlayMode, PlayOutcome, Playback, PlaybackStatus, PlaylistScheduler,
};
use crate::source::{PlaylistSource, SourceError};

/// Page shown by the Home command
pub const HOME_URL: &str = "about:home";

/// Result of a reload request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadOutcome {
    /// False when the fetch failed and the previous playlist was kept
    pub replaced: bool,
    pub item_count: usize,
    pub play: PlayOutcome,
}

pub struct KioskControl {
    playback: Playback,
    source: Arc<dyn PlaylistSource>,
}

impl KioskControl {
    pub fn new(playback: Playback, source: Arc<dyn PlaylistSource>) -> Self {
        Self { playback, source }
    }

    fn scheduler(&self) -> &PlaylistScheduler {
        self.playback.scheduler()
    }

    fn display(&self) -> &RemoteDisplayClient {
        self.playback.display()
    }

    pub fn on_play(&self) -> PlayOutcome {
        self.playback.start()
    }

    /// Request the running loop to stop; it exits at its next tick
    pub fn on_stop(&self) {
        info!("Stop requested");
        self.scheduler().set_mode(PlayMode::Stopped);
    }

    /// Stop, refetch the playlist, then play whatever is loaded
    pub async fn on_reload(&self) -> ReloadOutcome {
        self.on_stop();
        let replaced = self.load_playlist().await.is_ok();
        let play = self.on_play();
        ReloadOutcome {
            replaced,
            item_count: self.scheduler().len(),
            play,
        }
    }

    pub fn on_status(&self) -> PlaybackStatus {
        self.scheduler().status()
    }

    pub fn playlist(&self) -> Vec<PlayItem> {
        self.scheduler().items()
    }

    /// Stop playback and send the display to its home page
    pub async fn on_home(&self) {
        self.on_stop();
        self.display().send(&DisplayCommand::navigate(HOME_URL)).await;
    }

    /// Ask the display to refresh the current page
    pub async fn on_refresh(&self) {
        self.display().send(&DisplayCommand::Reload).await;
    }

    /// Fetch, validate and install a playlist. On any failure the previous
    /// playlist stays in place.
    pub async fn load_playlist(&self) -> Result<usize, SourceError> {
        let result = async {
            let items = self.source.fetch_ordered_playlist().await?;
            playlist::validate(&items)?;
            Ok::<_, SourceError>(items)
        }
        .await;

        match result {
            Ok(items) => {
                let count = items.len();
                self.scheduler().replace_playlist(items);
                info!("Loaded {} playlist item(s) from {}", count, self.source.name());
                Ok(count)
            }
            Err(e) => {
                warn!(
                    "Playlist from {} not loaded, keeping {} item(s): {}",
                    self.source.name(),
                    self.scheduler().len(),
                    e
                );
                Err(e)
            }
        }
    }
}
