//! Discord webhook delivery.

use std::path::Path;

use anyhow::Context;
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::info;

use crate::models::Alert;

/// Embed accent color (red).
const EMBED_COLOR: u32 = 15_158_332;

/// Posts alert notifications to a Discord webhook.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    webhook_url: String,
}

impl Notifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url: webhook_url.into(),
        }
    }

    /// Delivers one alert with its snapshot attached.
    pub async fn notify(&self, alert: &Alert, image: &Path) -> anyhow::Result<()> {
        let payload = build_payload(alert);
        let bytes = tokio::fs::read(image)
            .await
            .with_context(|| format!("read snapshot {}", image.display()))?;

        let form = reqwest::multipart::Form::new()
            .text("payload_json", payload.to_string())
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes)
                    .file_name("map.png")
                    .mime_str("image/png")
                    .context("attach snapshot")?,
            );

        self.http
            .post(&self.webhook_url)
            .multipart(form)
            .send()
            .await
            .context("post to webhook")?
            .error_for_status()
            .context("webhook rejected notification")?;

        info!(id = %alert.id, "notification delivered");
        Ok(())
    }
}

fn build_payload(alert: &Alert) -> serde_json::Value {
    let street = alert.street.as_deref().unwrap_or("unknown street");
    let reporter = alert.report_by.as_deref().unwrap_or("an anonymous wazer");
    let timestamp = OffsetDateTime::from_unix_timestamp_nanos(i128::from(alert.since) * 1_000_000)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
        .format(&Rfc3339)
        .unwrap_or_default();

    json!({
        "content": "Police reported nearby!",
        "embeds": [{
            "title": format!("Police sighting on {street}"),
            "description": format!(
                "Reported by {reporter}, confirmed {} times",
                alert.n_thumbs_up
            ),
            "color": EMBED_COLOR,
            "footer": { "text": format!("Report {}", alert.id) },
            "timestamp": timestamp,
            "image": { "url": "attachment://map.png" }
        }]
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{build_payload, Notifier};
    use crate::models::Alert;

    fn alert() -> Alert {
        Alert {
            id: "abc-123".to_owned(),
            x: 12.0565,
            y: 49.0134,
            n_thumbs_up: 3,
            report_by: Some("wazer_4711".to_owned()),
            street: Some("Friedenstraße".to_owned()),
            since: 1_686_571_200_000,
            image: None,
        }
    }

    #[test]
    fn payload_carries_embed_fields() {
        let payload = build_payload(&alert());
        let embed = &payload["embeds"][0];

        assert_eq!(embed["title"], "Police sighting on Friedenstraße");
        assert_eq!(embed["color"], 15_158_332);
        assert_eq!(embed["footer"]["text"], "Report abc-123");
        assert_eq!(embed["image"]["url"], "attachment://map.png");
        assert_eq!(embed["timestamp"], "2023-06-12T12:00:00Z");
    }

    #[test]
    fn payload_tolerates_absent_fields() {
        let mut anonymous = alert();
        anonymous.street = None;
        anonymous.report_by = None;

        let embed = &build_payload(&anonymous)["embeds"][0];
        assert_eq!(embed["title"], "Police sighting on unknown street");
        assert_eq!(
            embed["description"],
            "Reported by an anonymous wazer, confirmed 3 times"
        );
    }

    #[tokio::test]
    async fn posts_multipart_to_webhook() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/webhook")
            .match_header(
                "content-type",
                mockito::Matcher::Regex("multipart/form-data".to_owned()),
            )
            .with_status(200)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("abc-123.png");
        fs::write(&image, b"png bytes").unwrap();

        let notifier = Notifier::new(format!("{}/webhook", server.url()));
        notifier.notify(&alert(), &image).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_webhook_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/webhook")
            .with_status(400)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("abc-123.png");
        fs::write(&image, b"png bytes").unwrap();

        let notifier = Notifier::new(format!("{}/webhook", server.url()));
        assert!(notifier.notify(&alert(), &image).await.is_err());
    }
}
