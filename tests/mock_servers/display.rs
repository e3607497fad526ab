#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Mock remote display for testing
//!
//! Simulates the kiosk browser's TCP line protocol: one command line per
//! connection, answered with a single reply line.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Mock display server
pub struct MockDisplay {
    addr: SocketAddr,
    received: Arc<RwLock<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl MockDisplay {
    /// Start a mock display on a random port
    pub async fn start() -> Self {
        let received = Arc::new(RwLock::new(Vec::new()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let received_clone = received.clone();
        let handle = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, _)) => {
                        let received = received_clone.clone();
                        tokio::spawn(async move {
                            handle_connection(stream, received).await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        Self {
            addr,
            received,
            handle,
        }
    }

    /// Get the server address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Command lines received so far, without the newline
    pub async fn received(&self) -> Vec<String> {
        self.received.read().await.clone()
    }

    /// Wait until at least `count` commands have arrived
    pub async fn wait_for(&self, count: usize, within: Duration) -> Vec<String> {
        let _ = tokio::time::timeout(within, async {
            loop {
                if self.received.read().await.len() >= count {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        self.received().await
    }

    /// Stop the mock server
    pub async fn stop(self) {
        self.handle.abort();
    }
}

/// Handle a single command connection
async fn handle_connection(stream: TcpStream, received: Arc<RwLock<Vec<String>>>) {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    if let Ok(n) = reader.read_line(&mut line).await {
        if n == 0 {
            return;
        }
        received.write().await.push(line.trim_end().to_string());
        let _ = writer.write_all(b"ok\n").await;
    }
}
