//! Playlist sources
//!
//! A source produces the ordered playlist for this device. The dashboard is
//! the normal source; the static source serves the playlist stored in the
//! device properties when enrolment is turned off.

pub mod dashboard;

pub use dashboard::{DashboardSource, DeviceRecord};

use async_trait::async_trait;

use crate::playlist::{PlayItem, PlaylistError, UnknownCommand};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("dashboard request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid dashboard URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("dashboard answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed dashboard payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("navigation item at order {order} has no page")]
    MissingPage { order: i64 },

    #[error("device is not assigned a playlist")]
    NoPlaylist,

    #[error(transparent)]
    UnknownCommand(#[from] UnknownCommand),

    #[error("invalid playlist: {0}")]
    Invalid(#[from] PlaylistError),
}

/// Anything that can hand over the ordered playlist for this device
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Fetch the playlist, already in play order
    async fn fetch_ordered_playlist(&self) -> Result<Vec<PlayItem>, SourceError>;
}

/// Fixed playlist, normally the one stored in the properties file
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    items: Vec<PlayItem>,
}

impl StaticSource {
    pub fn new(items: Vec<PlayItem>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl PlaylistSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch_ordered_playlist(&self) -> Result<Vec<PlayItem>, SourceError> {
        Ok(self.items.clone())
    }
}
