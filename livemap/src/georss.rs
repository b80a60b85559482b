//! Traffic alerts from the Waze live map georss feed.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "geo")]
use geo_types::{point, Point};
use serde::Deserialize;
use thiserror::Error;
#[cfg(feature = "tracing")]
use tracing::{debug, instrument};

/// Georss endpoint of the live map.
pub const GEORSS_URL: &str = "https://www.waze.com/live-map/api/georss";

/// An error that can occur when fetching alerts.
#[derive(Debug, Error)]
pub enum GeorssError {
    /// Returned if the request fails or the server answers with a
    /// non-success status.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Returned if the JSON body cannot be parsed.
    #[error("decode json failed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Server environment the feed is read from. Coverage is split by region,
/// so the right one depends on where the bounding box lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Env {
    /// North America.
    #[default]
    Na,
    /// Rest of world.
    Row,
    /// Israel.
    Il,
}

impl Env {
    /// Value of the `env` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Na => "na",
            Self::Row => "row",
            Self::Il => "il",
        }
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error returned when parsing an unknown [`Env`] name.
#[derive(Debug, Error)]
#[error("unknown server environment: {0}")]
pub struct ParseEnvError(String);

impl FromStr for Env {
    type Err = ParseEnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "na" => Ok(Self::Na),
            "row" => Ok(Self::Row),
            "il" => Ok(Self::Il),
            other => Err(ParseEnvError(other.to_owned())),
        }
    }
}

/// The four corners of the rectangle alerts are queried within, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Northern edge latitude.
    pub top: f64,
    /// Southern edge latitude.
    pub bottom: f64,
    /// Western edge longitude.
    pub left: f64,
    /// Eastern edge longitude.
    pub right: f64,
}

/// Category of a community report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    /// Police sighting.
    Police,
    /// Accident.
    Accident,
    /// Traffic jam.
    Jam,
    /// Weather hazard.
    #[serde(rename = "WEATHERHAZARD")]
    WeatherHazard,
    /// Hazard on or near the road.
    Hazard,
    /// Miscellaneous report.
    Misc,
    /// Roadworks.
    Construction,
    /// Closed road.
    RoadClosed,
    /// Conversation marker.
    ChitChat,
    /// Any category this crate does not know about.
    #[serde(other)]
    Other,
}

/// Position of a report. The feed swaps the conventional order: `x` is the
/// longitude and `y` the latitude.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Location {
    /// Longitude.
    pub x: f64,
    /// Latitude.
    pub y: f64,
}

/// A single community report from the live map.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Unique report id.
    pub uuid: String,
    /// Report category.
    #[serde(rename = "type")]
    pub kind: AlertType,
    /// Report position.
    pub location: Location,
    /// Confirmations by other drivers. Absent means none yet.
    #[serde(default)]
    pub n_thumbs_up: u32,
    /// Reporter identifier.
    pub report_by: Option<String>,
    /// Street name, if the feed resolved one.
    pub street: Option<String>,
    /// When the report was made, in epoch milliseconds.
    pub pub_millis: i64,
}

#[cfg(feature = "geo")]
impl Alert {
    /// Position of the report.
    #[must_use]
    pub fn point(&self) -> Point<f64> {
        point! { x: self.location.x, y: self.location.y }
    }
}

#[derive(Debug, Deserialize)]
struct AlertsResponse {
    #[serde(default)]
    alerts: Vec<Alert>,
}

/// Client for the georss endpoint.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    env: Env,
}

impl Client {
    /// Create a client against [`GEORSS_URL`].
    #[must_use]
    pub fn new(env: Env) -> Self {
        Self::with_base_url(GEORSS_URL, env)
    }

    /// Create a client against a different endpoint, e.g. a proxy.
    pub fn with_base_url(base_url: impl Into<String>, env: Env) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            env,
        }
    }

    /// Fetch the current alerts within `bbox`.
    ///
    /// # Errors
    ///
    /// The function will return an error if the request fails or the
    /// response body cannot be decoded.
    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub async fn alerts(&self, bbox: &BoundingBox) -> Result<Vec<Alert>, GeorssError> {
        let body = self
            .http
            .get(&self.base_url)
            .query(&[
                ("top", bbox.top.to_string()),
                ("bottom", bbox.bottom.to_string()),
                ("left", bbox.left.to_string()),
                ("right", bbox.right.to_string()),
            ])
            .query(&[("env", self.env.as_str()), ("types", "alerts")])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        #[cfg(feature = "tracing")]
        debug!(bytes = body.len(), "fetched alerts");

        let response: AlertsResponse = serde_json::from_str(&body)?;
        Ok(response.alerts)
    }
}
