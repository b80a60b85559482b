//! The fetch-filter-notify-persist cycle and the scheduler around it.

use std::time::Duration;

use anyhow::{Context, Result};
use livemap::georss::{AlertType, BoundingBox, Client};
use time::OffsetDateTime;
use tracing::{error, info};

use crate::dedup::dedup;
use crate::discord::Notifier;
use crate::map::SnapshotClient;
use crate::models::Alert;
use crate::store::AlertStore;

/// Delay between poll cycles.
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Pause between consecutive webhook posts within one cycle, to stay clear
/// of the webhook rate limit.
const POST_PAUSE: Duration = Duration::from_secs(2);

/// Result of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing new was found; persisted state was left untouched.
    Quiet,
    /// New alerts were delivered and the full batch was persisted.
    Notified(usize),
}

/// One watcher over a bounding box, wiring the feed, the snapshot cache,
/// the webhook and the state store together.
pub struct Watcher<S> {
    feed: Client,
    bbox: BoundingBox,
    snapshots: SnapshotClient,
    notifier: Notifier,
    store: S,
}

impl<S: AlertStore> Watcher<S> {
    pub fn new(
        feed: Client,
        bbox: BoundingBox,
        snapshots: SnapshotClient,
        notifier: Notifier,
        store: S,
    ) -> Self {
        Self {
            feed,
            bbox,
            snapshots,
            notifier,
            store,
        }
    }

    /// Runs cycles forever, sleeping [`POLL_INTERVAL`] between them. A
    /// failed cycle is logged and the next one runs as scheduled.
    pub async fn run(&self) {
        loop {
            match self.cycle(now_millis()).await {
                Ok(CycleOutcome::Quiet) => info!("no new alerts"),
                Ok(CycleOutcome::Notified(count)) => info!(count, "cycle finished"),
                Err(e) => error!("cycle failed: {e:#}"),
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Executes one fetch-filter-notify-persist cycle, judging report age
    /// against `now_millis`.
    pub async fn cycle(&self, now_millis: i64) -> Result<CycleOutcome> {
        let raw = self.feed.alerts(&self.bbox).await.context("fetch alerts")?;
        let batch: Vec<Alert> = raw
            .into_iter()
            .filter(|alert| alert.kind == AlertType::Police)
            .map(Alert::from)
            .collect();

        let prior = self.store.load().context("load prior batch")?;
        let mut fresh = dedup(&batch, &prior, now_millis);
        info!(polled = batch.len(), new = fresh.len(), "checked feed");

        // A quiet cycle returns before the state write, so the previous
        // batch keeps anchoring the suppression window.
        if fresh.is_empty() {
            return Ok(CycleOutcome::Quiet);
        }

        let count = fresh.len();
        for alert in &mut fresh {
            let path = self
                .snapshots
                .resolve(alert)
                .await
                .context("resolve snapshot")?;
            alert.image = Some(path);
        }

        for alert in &mut fresh {
            let Some(path) = alert.image.clone() else {
                continue;
            };

            self.notifier
                .notify(alert, &path)
                .await
                .context("deliver notification")?;

            self.snapshots
                .remove(&path)
                .await
                .context("remove delivered snapshot")?;
            alert.image = None;

            tokio::time::sleep(POST_PAUSE).await;
        }

        self.store.save(&batch).context("save batch")?;
        Ok(CycleOutcome::Notified(count))
    }
}

fn now_millis() -> i64 {
    i64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
}
