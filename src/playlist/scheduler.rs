//! PlaylistScheduler - shared playlist position, countdown and mode
//!
//! Every operation takes the single state mutex, does its bookkeeping and
//! releases it before returning. Nothing here sleeps or performs I/O, so the
//! lock is never held across a suspension point.
//!
//! Besides the plain operations (`tick`, `advance`, `set_mode`, ...) the
//! scheduler hands out a [`RunId`] for each playback run. A run that has been
//! superseded by a newer one (Stop followed by an immediate Play) sees itself
//! as "not playing" and leaves the mode alone when it exits.

use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use super::{PlayCommand, PlayItem, PlayMode};

/// Identifies one execution of the playback loop
pub type RunId = u64;

/// Why a playback run was not started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRefusal {
    AlreadyRunning,
    EmptyPlaylist,
}

/// Snapshot for the status endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackStatus {
    pub mode: PlayMode,
    pub current_index: usize,
    pub current_item: Option<PlayItem>,
    pub remaining_secs: i64,
    pub item_count: usize,
}

#[derive(Debug, Default)]
struct PlaylistState {
    items: Vec<PlayItem>,
    current_index: usize,
    remaining_secs: i64,
    mode: PlayMode,
    run: RunId,
}

impl PlaylistState {
    /// Current item, arming the countdown from its value
    fn current(&mut self) -> Option<PlayItem> {
        let item = self.items.get(self.current_index)?.clone();
        self.remaining_secs = item.value;
        Some(item)
    }

    fn tick(&mut self) -> bool {
        self.remaining_secs -= 1;
        self.remaining_secs < 1 || self.mode != PlayMode::Playing
    }

    fn advance(&mut self) -> Option<PlayItem> {
        if self.mode != PlayMode::Playing {
            return None;
        }

        let next = self.current_index + 1;
        let Some(item) = self.items.get(next).cloned() else {
            debug!("End of playlist after {} item(s)", self.items.len());
            self.rewind();
            return None;
        };
        self.current_index = next;

        match item.command {
            PlayCommand::NavigateUrl => {
                self.remaining_secs = item.value;
                Some(item)
            }
            PlayCommand::Loop => {
                match usize::try_from(item.value)
                    .ok()
                    .filter(|target| *target < self.items.len())
                {
                    Some(target) => {
                        self.current_index = target;
                        self.current()
                    }
                    None => {
                        warn!(
                            "Loop at index {} targets {}, outside playlist of {}; ending playback",
                            next,
                            item.value,
                            self.items.len()
                        );
                        self.rewind();
                        None
                    }
                }
            }
            PlayCommand::None => {
                debug!("Playlist terminator at index {}", next);
                self.rewind();
                None
            }
        }
    }

    /// Back to the first item once the end of the list is reached, keeping
    /// `current_index` inside the playlist.
    fn rewind(&mut self) {
        self.current_index = 0;
        self.remaining_secs = 0;
    }
}

/// Thread-safe owner of the playlist state.
///
/// Constructed once at startup and shared as `Arc<PlaylistScheduler>`.
#[derive(Debug, Default)]
pub struct PlaylistScheduler {
    state: Mutex<PlaylistState>,
}

impl PlaylistScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PlaylistState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install a new playlist and rewind to its first item. Mode is unchanged.
    pub fn replace_playlist(&self, items: Vec<PlayItem>) {
        let mut state = self.lock();
        state.items = items;
        state.current_index = 0;
        state.remaining_secs = 0;
    }

    pub fn set_mode(&self, mode: PlayMode) {
        self.lock().mode = mode;
    }

    pub fn mode(&self) -> PlayMode {
        self.lock().mode
    }

    /// Item at the current position, arming the countdown with its dwell time.
    ///
    /// `None` when the playlist is empty.
    pub fn current_item(&self) -> Option<PlayItem> {
        self.lock().current()
    }

    /// Count one second down. Returns true once the countdown is exhausted or
    /// playback is no longer in `Playing` mode.
    pub fn tick(&self) -> bool {
        self.lock().tick()
    }

    /// Move to the next item, following loop jumps.
    ///
    /// `None` signals the caller to stop: end of playlist, a terminator item,
    /// or mode is not `Playing`.
    pub fn advance(&self) -> Option<PlayItem> {
        self.lock().advance()
    }

    pub fn status(&self) -> PlaybackStatus {
        let state = self.lock();
        PlaybackStatus {
            mode: state.mode,
            current_index: state.current_index,
            current_item: state.items.get(state.current_index).cloned(),
            remaining_secs: state.remaining_secs,
            item_count: state.items.len(),
        }
    }

    pub fn items(&self) -> Vec<PlayItem> {
        self.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    // =========================================================================
    // Run-aware operations (used by the playback loop)
    // =========================================================================

    /// Switch to `Playing` and arm the current item, in one critical section.
    pub fn begin_run(&self) -> Result<(RunId, PlayItem), StartRefusal> {
        let mut state = self.lock();
        if state.mode == PlayMode::Playing {
            return Err(StartRefusal::AlreadyRunning);
        }
        let item = state.current().ok_or(StartRefusal::EmptyPlaylist)?;
        state.mode = PlayMode::Playing;
        state.run += 1;
        Ok((state.run, item))
    }

    /// True while `run` is the newest run and mode is `Playing`
    pub fn is_active_run(&self, run: RunId) -> bool {
        let state = self.lock();
        state.run == run && state.mode == PlayMode::Playing
    }

    /// [`tick`](Self::tick) for a specific run. A superseded run is told its
    /// time has elapsed without touching the newer run's countdown.
    pub fn tick_run(&self, run: RunId) -> bool {
        let mut state = self.lock();
        if state.run != run {
            return true;
        }
        state.tick()
    }

    /// [`advance`](Self::advance) for a specific run
    pub fn advance_run(&self, run: RunId) -> Option<PlayItem> {
        let mut state = self.lock();
        if state.run != run {
            return None;
        }
        state.advance()
    }

    /// Mark the end of `run`: mode becomes `Idle` unless a newer run has started.
    pub fn finish_run(&self, run: RunId) {
        let mut state = self.lock();
        if state.run == run {
            state.mode = PlayMode::Idle;
        }
    }
}
