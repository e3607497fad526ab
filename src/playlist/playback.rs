//! Playback loop - walks the playlist and drives the remote display
//!
//! One task per run. The task sends the current item, counts its dwell time
//! down one tick at a time through the scheduler, then advances. A Stop is
//! cooperative: the task notices the mode change at its next tick, so the
//! worst-case latency is one tick plus a display round trip already in flight.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::scheduler::{PlaylistScheduler, RunId, StartRefusal};
use super::PlayItem;
use crate::display::{DisplayCommand, RemoteDisplayClient};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Result of a Play request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayOutcome {
    Started,
    AlreadyRunning,
    /// Nothing to play; the display was not contacted
    EmptyPlaylist,
}

impl fmt::Display for PlayOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayOutcome::Started => write!(f, "started"),
            PlayOutcome::AlreadyRunning => write!(f, "already running"),
            PlayOutcome::EmptyPlaylist => write!(f, "empty playlist"),
        }
    }
}

/// Starts playback runs. Cheap to clone; every clone shares the scheduler.
#[derive(Debug, Clone)]
pub struct Playback {
    scheduler: Arc<PlaylistScheduler>,
    display: RemoteDisplayClient,
    tick_interval: Duration,
    shutdown: CancellationToken,
}

impl Playback {
    pub fn new(
        scheduler: Arc<PlaylistScheduler>,
        display: RemoteDisplayClient,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            scheduler,
            display,
            tick_interval: DEFAULT_TICK_INTERVAL,
            shutdown,
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn scheduler(&self) -> &Arc<PlaylistScheduler> {
        &self.scheduler
    }

    pub fn display(&self) -> &RemoteDisplayClient {
        &self.display
    }

    /// Start a playback run in the background.
    ///
    /// Rejected while a run is playing, and refused for an empty playlist.
    pub fn start(&self) -> PlayOutcome {
        match self.scheduler.begin_run() {
            Ok((run, first)) => {
                info!("Starting playlist run {} at '{}'", run, first.param);
                let runner = self.clone();
                tokio::spawn(async move { runner.run(run, first).await });
                PlayOutcome::Started
            }
            Err(StartRefusal::AlreadyRunning) => {
                debug!("Play requested while already running");
                PlayOutcome::AlreadyRunning
            }
            Err(StartRefusal::EmptyPlaylist) => {
                warn!("Play requested with an empty playlist");
                PlayOutcome::EmptyPlaylist
            }
        }
    }

    async fn run(self, run: RunId, mut item: PlayItem) {
        'playlist: while !item.param.is_empty() {
            if !self.scheduler.is_active_run(run) {
                break;
            }

            self.display
                .send(&DisplayCommand::navigate(item.param.as_str()))
                .await;
            info!("Playing '{}'", item.param);

            if item.is_indefinite() {
                info!("Dwell time {} on '{}': holding until stopped", item.value, item.param);
                break;
            }
            debug!("Waiting {}s on '{}'", item.value, item.param);

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("Playlist run {} received shutdown signal", run);
                        break 'playlist;
                    }
                    _ = tokio::time::sleep(self.tick_interval) => {
                        if self.scheduler.tick_run(run) {
                            break;
                        }
                    }
                }
            }

            match self.scheduler.advance_run(run) {
                Some(next) if self.scheduler.is_active_run(run) => item = next,
                _ => break,
            }
        }

        self.scheduler.finish_run(run);
        info!("Exiting playlist run {}", run);
    }
}
