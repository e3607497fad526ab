//! Application wiring
//!
//! Builds the playback core, the playlist source and the HTTP router from a
//! loaded [`Config`] and device identity. `main` only adds logging, signals
//! and the listener on top.

use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::api::{self, AppState};
use crate::config::Config;
use crate::control::KioskControl;
use crate::device::DeviceProperties;
use crate::display::RemoteDisplayClient;
use crate::playlist::{Playback, PlaylistScheduler};
use crate::source::{DashboardSource, PlaylistSource, StaticSource};

/// Wired application, ready to serve
pub struct App {
    pub router: Router,
    pub control: Arc<KioskControl>,
}

/// Pick the playlist source: the dashboard when enrolment is on, otherwise
/// the playlist stored in the properties file.
fn playlist_source(config: &Config, device: &DeviceProperties) -> Result<Arc<dyn PlaylistSource>> {
    if config.dashboard.enrol {
        let dashboard = DashboardSource::new(
            device,
            Duration::from_secs(config.dashboard.request_timeout_secs),
        )?;
        tracing::info!("Dashboard at {}", dashboard.site());
        Ok(Arc::new(dashboard))
    } else {
        tracing::info!(
            "Enrolment disabled, using {} playlist item(s) from the properties file",
            device.playlist.len()
        );
        Ok(Arc::new(StaticSource::new(device.playlist.clone())))
    }
}

/// Build the app, load the initial playlist and start playback if configured.
///
/// Playback runs stop when `shutdown` is cancelled.
pub async fn build(
    config: &Config,
    device: Arc<DeviceProperties>,
    shutdown: CancellationToken,
) -> Result<App> {
    let display_client = RemoteDisplayClient::from_config(&config.display);
    tracing::info!("Remote display at {}", display_client.addr());

    let scheduler = Arc::new(PlaylistScheduler::new());
    let playback = Playback::new(scheduler, display_client, shutdown)
        .with_tick_interval(Duration::from_millis(config.playback.tick_interval_ms));

    let source = playlist_source(config, &device)?;
    let control = Arc::new(KioskControl::new(playback, source));
    if control.load_playlist().await.is_err() {
        tracing::warn!("Starting with an empty playlist; /reload retries the fetch");
    }
    if config.playback.autoplay {
        tracing::info!("Autoplay: {}", control.on_play());
    }

    let router = api::router(AppState::new(control.clone(), device));
    Ok(App { router, control })
}
