use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use livemap::georss::{BoundingBox, Env};

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bbox: BoundingBox,
    pub waze_env: Env,
    pub mapbox_token: String,
    pub webhook_url: String,
    pub image_dir: PathBuf,
    pub state_file: PathBuf,
}

impl Config {
    /// Reads configuration from the environment. Missing or unparsable
    /// required variables abort startup.
    pub fn load() -> Result<Self> {
        let bbox = BoundingBox {
            top: required_f64("BBOX_TOP")?,
            bottom: required_f64("BBOX_BOTTOM")?,
            left: required_f64("BBOX_LEFT")?,
            right: required_f64("BBOX_RIGHT")?,
        };

        let waze_env = match env::var("WAZE_ENV") {
            Ok(value) => value.parse().context("WAZE_ENV")?,
            Err(_) => Env::Row,
        };

        Ok(Self {
            bbox,
            waze_env,
            mapbox_token: required("MAPBOX_TOKEN")?,
            webhook_url: required("DISCORD_WEBHOOK_URL")?,
            image_dir: optional_path("IMAGE_DIR", "images"),
            state_file: optional_path("STATE_FILE", "alerts.json"),
        })
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{name} must be set"))
}

fn required_f64(name: &str) -> Result<f64> {
    required(name)?
        .parse()
        .with_context(|| format!("{name} must be a number"))
}

fn optional_path(name: &str, default: &str) -> PathBuf {
    env::var(name).map_or_else(|_| PathBuf::from(default), PathBuf::from)
}
