//! Device identity and bootstrap properties
//!
//! The properties file identifies this kiosk to the dashboard (UUID, logical
//! name, address) and carries a fallback playlist used when automatic
//! enrolment is disabled. It is created on first start and the host fields are
//! refreshed from the running machine on every load.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::net::UdpSocket;
use std::path::Path;

use crate::playlist::PlayItem;

pub const DEFAULT_DASHBOARD_SITE: &str = "http://localhost:3100/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProperties {
    #[serde(rename = "UUID")]
    pub uuid: String,
    #[serde(rename = "LogicalName", default)]
    pub logical_name: String,
    #[serde(rename = "HostName", default)]
    pub host_name: String,
    #[serde(rename = "IPAddress", default)]
    pub ip_address: String,
    #[serde(rename = "DashboardSite", default = "default_dashboard_site")]
    pub dashboard_site: String,
    #[serde(rename = "PlayList", default, deserialize_with = "null_as_empty")]
    pub playlist: Vec<PlayItem>,
}

fn default_dashboard_site() -> String {
    DEFAULT_DASHBOARD_SITE.to_string()
}

/// Older files were written with `"PlayList": null`
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<PlayItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<PlayItem>>::deserialize(deserializer)?.unwrap_or_default())
}

impl DeviceProperties {
    /// Fresh identity for a device that has never been enrolled
    pub fn generate() -> Self {
        let host_name = hostname();
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            logical_name: host_name.clone(),
            host_name,
            ip_address: outbound_ip(),
            dashboard_site: default_dashboard_site(),
            playlist: Vec::new(),
        }
    }

    /// Load the properties file, creating it with a generated identity if it
    /// does not exist yet. A file that exists but cannot be parsed is an error.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let properties = Self::generate();
                properties.save(path)?;
                tracing::info!(
                    "Created device properties at {} (uuid {})",
                    path.display(),
                    properties.uuid
                );
                return Ok(properties);
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read properties {}", path.display()))
            }
        };

        let mut properties: DeviceProperties = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse properties {}", path.display()))?;
        properties.host_name = hostname();
        properties.ip_address = outbound_ip();
        tracing::debug!("Loaded device properties from {}", path.display());
        Ok(properties)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write properties {}", path.display()))?;
        Ok(())
    }
}

/// Hostname of this machine, empty if it cannot be represented
pub fn hostname() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}

/// Address of the interface used for outbound traffic.
///
/// Connecting a UDP socket sends nothing; it only asks the OS which local
/// address would be used. Falls back to `127.0.0.1`.
pub fn outbound_ip() -> String {
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|e| {
            tracing::warn!("Could not determine outbound IP: {}", e);
            "127.0.0.1".to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_fills_identity() {
        let properties = DeviceProperties::generate();
        assert!(uuid::Uuid::parse_str(&properties.uuid).is_ok());
        assert_eq!(properties.logical_name, properties.host_name);
        assert!(!properties.ip_address.is_empty());
        assert_eq!(properties.dashboard_site, DEFAULT_DASHBOARD_SITE);
        assert!(properties.playlist.is_empty());
    }

    #[test]
    fn creates_file_on_first_load_and_reuses_it() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let path = temp_dir.path().join("nested").join("properties.json");

        let first = DeviceProperties::load_or_create(&path).expect("create");
        assert!(path.exists());

        let second = DeviceProperties::load_or_create(&path).expect("reload");
        assert_eq!(first.uuid, second.uuid);
    }

    #[test]
    fn loads_existing_file_and_refreshes_host_fields() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let path = temp_dir.path().join("properties.json");
        std::fs::write(
            &path,
            r#"{
                "UUID": "0b7c1f0e-5d7e-4f0c-9a3e-1c2d3e4f5a6b",
                "LogicalName": "lobby",
                "HostName": "old-host",
                "IPAddress": "10.9.9.9",
                "DashboardSite": "http://dashboard.local/",
                "PlayList": [{"Cmd": 1, "Param": "http://a", "Value": 15}]
            }"#,
        )
        .expect("write");

        let properties = DeviceProperties::load_or_create(&path).expect("load");

        assert_eq!(properties.logical_name, "lobby");
        assert_eq!(properties.dashboard_site, "http://dashboard.local/");
        assert_eq!(properties.host_name, hostname());
        assert_eq!(properties.playlist, vec![PlayItem::navigate("http://a", 15)]);
    }

    #[test]
    fn null_playlist_reads_as_empty() {
        let json = r#"{"UUID":"u","LogicalName":"n","HostName":"h","IPAddress":"i","DashboardSite":"s","PlayList":null}"#;
        let properties: DeviceProperties = serde_json::from_str(json).expect("parse");
        assert!(properties.playlist.is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let path = temp_dir.path().join("properties.json");
        std::fs::write(&path, "{ not json").expect("write");

        assert!(DeviceProperties::load_or_create(&path).is_err());
    }
}
