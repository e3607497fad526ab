//! Remote display control channel
//!
//! Line-oriented TCP protocol spoken by the kiosk browser process. Each command
//! uses its own connection: connect, write one line, read one reply line,
//! close. Delivery is best effort and at most once. A lost navigation is
//! repaired by the next playlist tick, so failures are logged and dropped.

use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::DisplayConfig;

/// Default connect timeout when none is configured
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
/// Default wait for the reply line
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(3);

/// Commands understood by the remote display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCommand {
    /// `window.location="<url>"`
    Navigate(String),
    /// Refresh the current page
    Reload,
}

impl DisplayCommand {
    pub fn navigate(url: impl Into<String>) -> Self {
        DisplayCommand::Navigate(url.into())
    }
}

impl fmt::Display for DisplayCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayCommand::Navigate(url) => write!(f, "window.location=\"{}\"", url),
            DisplayCommand::Reload => write!(f, "reload"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connection to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("display I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no reply from display within {0:?}")]
    ReplyTimeout(Duration),

    #[error("reading display reply failed: {0}")]
    Reply(#[source] std::io::Error),
}

impl DisplayError {
    /// True when the command line was written and flushed before the failure
    pub fn was_sent(&self) -> bool {
        matches!(self, DisplayError::ReplyTimeout(_) | DisplayError::Reply(_))
    }
}

/// Stateless client for the remote display. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RemoteDisplayClient {
    addr: String,
    connect_timeout: Duration,
    reply_timeout: Duration,
}

impl RemoteDisplayClient {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            addr: format!("{}:{}", host, port),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    pub fn from_config(config: &DisplayConfig) -> Self {
        Self::new(&config.host, config.port).with_timeouts(
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.reply_timeout_secs),
        )
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, reply_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.reply_timeout = reply_timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Deliver `command`, logging the reply or the failure. Never fails.
    pub async fn send(&self, command: &DisplayCommand) {
        match self.try_send(command).await {
            Ok(reply) => debug!("Display {} replied to '{}': {}", self.addr, command, reply),
            Err(e) if e.was_sent() => warn!("Display command '{}' sent, no reply: {}", command, e),
            Err(e) => warn!("Display command '{}' not delivered: {}", command, e),
        }
    }

    /// Deliver `command` and return the reply line (without the newline).
    ///
    /// The connection is owned by this call and closed on every return path.
    /// A peer that closes without replying yields an empty reply.
    pub async fn try_send(&self, command: &DisplayCommand) -> Result<String, DisplayError> {
        let stream = timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| DisplayError::ConnectTimeout {
                addr: self.addr.clone(),
                timeout: self.connect_timeout,
            })?
            .map_err(|source| DisplayError::Connect {
                addr: self.addr.clone(),
                source,
            })?;

        if let (Ok(local), Ok(remote)) = (stream.local_addr(), stream.peer_addr()) {
            debug!("Display connection {} -> {}", local, remote);
        }

        let (read_half, mut write_half) = stream.into_split();
        write_half
            .write_all(format!("{}\n", command).as_bytes())
            .await?;
        write_half.flush().await?;

        let mut reader = BufReader::new(read_half);
        let mut reply = String::new();
        timeout(self.reply_timeout, reader.read_line(&mut reply))
            .await
            .map_err(|_| DisplayError::ReplyTimeout(self.reply_timeout))?
            .map_err(DisplayError::Reply)?;

        Ok(reply.trim_end().to_string())
    }
}
