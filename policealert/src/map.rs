//! Static map snapshots for outgoing notifications.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::fs;
use tracing::debug;

use crate::models::Alert;

/// Mapbox static images endpoint, streets style.
const STATIC_MAPS_URL: &str = "https://api.mapbox.com/styles/v1/mapbox/streets-v11/static";

/// Latitude nudge for the marker so the pin tip does not sit on top of the
/// report position.
const MARKER_NUDGE_DEG: f64 = 0.0004;

const ZOOM: u8 = 15;
const WIDTH: u32 = 800;
const HEIGHT: u32 = 450;

/// Fetches and caches one map snapshot per alert id.
#[derive(Debug, Clone)]
pub struct SnapshotClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    image_dir: PathBuf,
}

impl SnapshotClient {
    pub fn new(token: impl Into<String>, image_dir: impl Into<PathBuf>) -> Self {
        Self::with_base_url(STATIC_MAPS_URL, token, image_dir)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
        image_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
            image_dir: image_dir.into(),
        }
    }

    /// Path of the snapshot for `alert`, fetching it if not cached yet.
    pub async fn resolve(&self, alert: &Alert) -> anyhow::Result<PathBuf> {
        let path = self.image_dir.join(format!("{}.png", alert.id));
        if path.exists() {
            debug!(path = %path.display(), "reusing cached snapshot");
            return Ok(path);
        }

        let url = format!(
            "{}/pin-l-police+d22d2d({:.6},{:.6})/{:.6},{:.6},{}/{}x{}",
            self.base_url,
            alert.x,
            alert.y + MARKER_NUDGE_DEG,
            alert.x,
            alert.y,
            ZOOM,
            WIDTH,
            HEIGHT,
        );
        let bytes = self
            .http
            .get(&url)
            .query(&[
                ("access_token", self.token.as_str()),
                ("logo", "false"),
                ("attribution", "false"),
            ])
            .send()
            .await
            .context("request map snapshot")?
            .error_for_status()
            .context("map snapshot request rejected")?
            .bytes()
            .await
            .context("read map snapshot body")?;

        fs::create_dir_all(&self.image_dir)
            .await
            .with_context(|| format!("create image directory {}", self.image_dir.display()))?;
        fs::write(&path, &bytes)
            .await
            .with_context(|| format!("write snapshot {}", path.display()))?;
        debug!(path = %path.display(), bytes = bytes.len(), "saved snapshot");

        Ok(path)
    }

    /// Removes a single snapshot after it has been delivered.
    pub async fn remove(&self, path: &Path) -> anyhow::Result<()> {
        fs::remove_file(path)
            .await
            .with_context(|| format!("remove snapshot {}", path.display()))
    }

    /// Deletes every cached snapshot. Used by the shutdown hook.
    pub async fn clear_cache(&self) -> anyhow::Result<()> {
        let mut entries = match fs::read_dir(&self.image_dir).await {
            Ok(entries) => entries,
            // Nothing was ever cached.
            Err(_) => return Ok(()),
        };
        while let Some(entry) = entries.next_entry().await? {
            fs::remove_file(entry.path())
                .await
                .with_context(|| format!("remove snapshot {}", entry.path().display()))?;
        }
        Ok(())
    }
}
