//! Dashboard web service client
//!
//! The dashboard keeps the device registry and the playlists. A device enrols
//! by posting its identity; the reply names the playlist assigned to it, which
//! is then fetched and converted to [`PlayItem`]s in `order`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{PlaylistSource, SourceError};
use crate::device::DeviceProperties;
use crate::playlist::{PlayCommand, PlayItem};

/// Body of the enrolment request
#[derive(Debug, Clone, Serialize)]
struct Enrolment<'a> {
    name: &'a str,
    ip: &'a str,
    uuid: &'a str,
}

/// Device as registered on the dashboard
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceRecord {
    pub id: i64,
    pub name: String,
    pub ip: String,
    pub uuid: String,
    pub place: Option<PlaceRecord>,
    pub playlist: Option<PlaylistRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaceRecord {
    pub id: i64,
    pub name: String,
    pub geoloc: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaylistRef {
    pub id: i64,
    pub name: String,
}

/// Playlist payload. Only the descriptive fields may be missing; a payload
/// without `playitems` is malformed, not empty.
#[derive(Debug, Clone, Deserialize)]
struct PlaylistRecord {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    name: String,
    playitems: Vec<PlayitemRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct PlayitemRecord {
    order: i64,
    cmd: i64,
    value: i64,
    /// Loop and terminator items may come without a page
    #[serde(default)]
    page: Option<PageRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct PageRecord {
    url: String,
}

/// Order by `order` (stable for ties) and convert to play items
fn to_play_items(mut records: Vec<PlayitemRecord>) -> Result<Vec<PlayItem>, SourceError> {
    records.sort_by_key(|record| record.order);
    records
        .into_iter()
        .map(|record| {
            let command = PlayCommand::try_from(record.cmd)?;
            let param = match (command, record.page) {
                (_, Some(page)) => page.url,
                (PlayCommand::NavigateUrl, None) => {
                    return Err(SourceError::MissingPage {
                        order: record.order,
                    })
                }
                (_, None) => String::new(),
            };
            Ok(PlayItem {
                command,
                param,
                value: record.value,
            })
        })
        .collect()
}

/// Fetches the playlist assigned to this device, enrolling on every fetch so
/// a playlist reassigned on the dashboard is picked up by the next reload.
#[derive(Debug, Clone)]
pub struct DashboardSource {
    http: Client,
    site: Url,
    name: String,
    ip: String,
    uuid: String,
}

impl DashboardSource {
    pub fn new(device: &DeviceProperties, request_timeout: Duration) -> Result<Self, SourceError> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            site: site_url(&device.dashboard_site)?,
            name: device.logical_name.clone(),
            ip: device.ip_address.clone(),
            uuid: device.uuid.clone(),
        })
    }

    pub fn site(&self) -> &Url {
        &self.site
    }

    /// Register this device and return the dashboard's record of it
    pub async fn enrol(&self) -> Result<DeviceRecord, SourceError> {
        let url = self.site.join("devices")?;
        let body = Enrolment {
            name: &self.name,
            ip: &self.ip,
            uuid: &self.uuid,
        };
        debug!(url = %url, uuid = %self.uuid, "Enrolling device");

        let response = self.http.post(url).json(&body).send().await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let device: DeviceRecord = response.json().await?;
        info!("Enrolled as device {} ({})", device.id, device.name);
        Ok(device)
    }

    async fn playlist(&self, id: i64) -> Result<PlaylistRecord, SourceError> {
        let url = self.site.join(&format!("playlists/{}.json", id))?;
        debug!(url = %url, "Fetching playlist");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Parse the configured site, making sure relative joins land under it
fn site_url(site: &str) -> Result<Url, url::ParseError> {
    if site.ends_with('/') {
        Url::parse(site)
    } else {
        Url::parse(&format!("{}/", site))
    }
}

#[async_trait]
impl PlaylistSource for DashboardSource {
    fn name(&self) -> &'static str {
        "dashboard"
    }

    async fn fetch_ordered_playlist(&self) -> Result<Vec<PlayItem>, SourceError> {
        let device = self.enrol().await?;
        let playlist_id = device.playlist.ok_or(SourceError::NoPlaylist)?.id;

        let playlist = self.playlist(playlist_id).await?;
        info!(
            "Fetched playlist {} '{}' with {} item(s)",
            playlist.id,
            playlist.name,
            playlist.playitems.len()
        );
        to_play_items(playlist.playitems)
    }
}
