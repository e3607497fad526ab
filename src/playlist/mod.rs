//! Playlist model and scheduling engine
//!
//! A playlist is an ordered list of [`PlayItem`]s. Navigation items put a URL on
//! the remote display for a dwell time; loop items redirect playback to another
//! index so a segment can repeat.
//!
//! - [`scheduler`] owns the shared playlist state (position, countdown, mode)
//! - [`playback`] runs the background task that walks the playlist

pub mod playback;
pub mod scheduler;

pub use playback::{PlayOutcome, Playback};
pub use scheduler::{PlaybackStatus, PlaylistScheduler, RunId, StartRefusal};

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a playlist entry does when it becomes current.
///
/// Encoded as an integer in the properties file and on the dashboard wire
/// (0 = none, 1 = navigate, 2 = loop).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum PlayCommand {
    /// Reserved as list terminator
    #[default]
    None,
    /// Navigate the display to `param` for `value` seconds
    NavigateUrl,
    /// Jump to index `value`
    Loop,
}

impl TryFrom<i64> for PlayCommand {
    type Error = UnknownCommand;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(PlayCommand::None),
            1 => Ok(PlayCommand::NavigateUrl),
            2 => Ok(PlayCommand::Loop),
            other => Err(UnknownCommand(other)),
        }
    }
}

impl From<PlayCommand> for i64 {
    fn from(command: PlayCommand) -> Self {
        match command {
            PlayCommand::None => 0,
            PlayCommand::NavigateUrl => 1,
            PlayCommand::Loop => 2,
        }
    }
}

/// Command code outside the known set
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown play command code {0}")]
pub struct UnknownCommand(pub i64);

/// One playlist entry.
///
/// Field names follow the `PlayList` array of the device properties file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayItem {
    #[serde(rename = "Cmd")]
    pub command: PlayCommand,
    /// URL for navigation items, unused otherwise
    #[serde(rename = "Param", default)]
    pub param: String,
    /// Dwell seconds for navigation items (<= 0 means indefinite), target index for loops
    #[serde(rename = "Value", default)]
    pub value: i64,
}

impl PlayItem {
    pub fn navigate(url: impl Into<String>, dwell_secs: i64) -> Self {
        Self {
            command: PlayCommand::NavigateUrl,
            param: url.into(),
            value: dwell_secs,
        }
    }

    pub fn jump_to(index: i64) -> Self {
        Self {
            command: PlayCommand::Loop,
            param: String::new(),
            value: index,
        }
    }

    /// Navigation item that stays on screen until stopped
    pub fn is_indefinite(&self) -> bool {
        self.value <= 0
    }
}

/// Playback mode of the scheduler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    /// No playback task is running
    #[default]
    Idle,
    Playing,
    /// Stop requested; the task exits at its next check
    Stopped,
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayMode::Idle => write!(f, "idle"),
            PlayMode::Playing => write!(f, "playing"),
            PlayMode::Stopped => write!(f, "stopped"),
        }
    }
}

/// A playlist rejected at load time
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaylistError {
    #[error("loop at index {index} targets {target}, outside playlist of {len} item(s)")]
    LoopTargetOutOfRange { index: usize, target: i64, len: usize },

    #[error("loop at index {index} targets {target}, which is not a navigation item")]
    LoopTargetNotPlayable { index: usize, target: i64 },
}

/// Check that every loop item jumps to a navigation item inside the playlist.
///
/// This rejects out-of-range targets, self-loops and loop-to-loop chains, which
/// would otherwise stall the countdown or index past the end.
pub fn validate(items: &[PlayItem]) -> Result<(), PlaylistError> {
    for (index, item) in items.iter().enumerate() {
        if item.command != PlayCommand::Loop {
            continue;
        }
        let target = usize::try_from(item.value)
            .ok()
            .filter(|t| *t < items.len())
            .ok_or(PlaylistError::LoopTargetOutOfRange {
                index,
                target: item.value,
                len: items.len(),
            })?;
        if items[target].command != PlayCommand::NavigateUrl {
            return Err(PlaylistError::LoopTargetNotPlayable {
                index,
                target: item.value,
            });
        }
    }
    Ok(())
}
