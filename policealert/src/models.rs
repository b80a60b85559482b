use std::path::PathBuf;

use geo::{point, Point};
use livemap::georss;
use serde::{Deserialize, Serialize};

/// A police report as tracked between poll cycles.
///
/// Field names follow the upstream feed, including its swapped coordinate
/// convention: `x` is the longitude and `y` the latitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub n_thumbs_up: u32,
    #[serde(default)]
    pub report_by: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    /// When the report was made, in epoch milliseconds. Immutable.
    pub since: i64,
    /// Local snapshot path while a notification is in flight. Never persisted.
    #[serde(skip)]
    pub image: Option<PathBuf>,
}

impl Alert {
    /// Position of the report.
    pub fn point(&self) -> Point<f64> {
        point! { x: self.x, y: self.y }
    }
}

impl From<georss::Alert> for Alert {
    fn from(raw: georss::Alert) -> Self {
        let georss::Alert {
            uuid,
            kind: _,
            location,
            n_thumbs_up,
            report_by,
            street,
            pub_millis,
        } = raw;

        Self {
            id: uuid,
            x: location.x,
            y: location.y,
            n_thumbs_up,
            report_by,
            street,
            since: pub_millis,
            image: None,
        }
    }
}
