//! Filtering of freshly fetched reports against the previous batch.

use geo::prelude::HaversineDistance;

use crate::models::Alert;

/// How long a prior report keeps suppressing nearby re-sightings, measured
/// against the current processing time.
pub const SUPPRESS_WINDOW_MS: i64 = 3 * 60 * 60 * 1000;

/// Radius within which a report counts as a re-sighting of a prior one.
pub const SUPPRESS_RADIUS_M: f64 = 200.0;

/// Returns the subset of `batch` that is genuinely new, preserving order.
///
/// A report is dropped if its id already appears in `prior`, or if any prior
/// report is both recent (`since` within [`SUPPRESS_WINDOW_MS`] of
/// `now_millis`) and within [`SUPPRESS_RADIUS_M`] of its position. Only the
/// prior report's age is examined, never the new one's.
pub fn dedup(batch: &[Alert], prior: &[Alert], now_millis: i64) -> Vec<Alert> {
    batch
        .iter()
        .filter(|alert| !prior.iter().any(|seen| seen.id == alert.id))
        .filter(|alert| !prior.iter().any(|seen| covers(seen, alert, now_millis)))
        .cloned()
        .collect()
}

fn covers(seen: &Alert, alert: &Alert, now_millis: i64) -> bool {
    now_millis - seen.since <= SUPPRESS_WINDOW_MS
        && seen.point().haversine_distance(&alert.point()) <= SUPPRESS_RADIUS_M
}

#[cfg(test)]
mod tests {
    use super::{dedup, SUPPRESS_WINDOW_MS};
    use crate::models::Alert;

    const HOUR_MS: i64 = 60 * 60 * 1000;
    const NOW: i64 = 1_686_600_000_000;

    fn alert(id: &str, y: f64, x: f64, since: i64) -> Alert {
        Alert {
            id: id.to_owned(),
            x,
            y,
            n_thumbs_up: 0,
            report_by: None,
            street: None,
            since,
            image: None,
        }
    }

    #[test]
    fn empty_prior_keeps_everything() {
        let batch = vec![
            alert("a", 49.0, 12.05, NOW - HOUR_MS),
            alert("b", 49.1, 12.10, NOW),
        ];
        assert_eq!(dedup(&batch, &[], NOW), batch);
    }

    #[test]
    fn known_id_is_dropped_regardless_of_position() {
        let prior = vec![alert("a", 49.0, 12.05, NOW - 48 * HOUR_MS)];
        let batch = vec![alert("a", 52.5, 13.40, NOW)];
        assert!(dedup(&batch, &prior, NOW).is_empty());
    }

    #[test]
    fn nearby_recent_prior_suppresses() {
        // ~55 m north of the prior report, which is 30 minutes old.
        let prior = vec![alert("old", 49.0, 12.05, NOW - HOUR_MS / 2)];
        let batch = vec![alert("new", 49.0005, 12.05, NOW)];
        assert!(dedup(&batch, &prior, NOW).is_empty());
    }

    #[test]
    fn stale_prior_does_not_suppress() {
        // Same positions, but the prior report is 4 hours old.
        let prior = vec![alert("old", 49.0, 12.05, NOW - 4 * HOUR_MS)];
        let batch = vec![alert("new", 49.0005, 12.05, NOW)];
        assert_eq!(dedup(&batch, &prior, NOW), batch);
    }

    #[test]
    fn distant_prior_does_not_suppress() {
        // ~5.5 km away, well outside the radius, no matter how fresh.
        let prior = vec![alert("old", 49.0, 12.05, NOW)];
        let batch = vec![alert("new", 49.05, 12.05, NOW)];
        assert_eq!(dedup(&batch, &prior, NOW), batch);
    }

    #[test]
    fn window_boundary_still_suppresses() {
        let prior = vec![alert("old", 49.0, 12.05, NOW - SUPPRESS_WINDOW_MS)];
        let batch = vec![alert("new", 49.0005, 12.05, NOW)];
        assert!(dedup(&batch, &prior, NOW).is_empty());
    }

    #[test]
    fn any_single_prior_match_suffices() {
        let prior = vec![
            alert("far", 52.5, 13.40, NOW),
            alert("stale", 49.0, 12.05, NOW - 5 * HOUR_MS),
            alert("close", 49.0001, 12.05, NOW - HOUR_MS),
        ];
        let batch = vec![alert("new", 49.0, 12.05, NOW)];
        assert!(dedup(&batch, &prior, NOW).is_empty());
    }

    #[test]
    fn order_is_preserved() {
        let prior = vec![alert("seen", 49.0, 12.05, NOW - 30 * HOUR_MS)];
        let batch = vec![
            alert("first", 49.2, 12.05, NOW),
            alert("seen", 49.3, 12.05, NOW),
            alert("last", 49.4, 12.05, NOW),
        ];
        let fresh = dedup(&batch, &prior, NOW);
        assert_eq!(fresh.len(), 2);
        assert_eq!(fresh[0].id, "first");
        assert_eq!(fresh[1].id, "last");
    }

    #[test]
    fn never_returns_a_prior_id() {
        let prior = vec![
            alert("a", 49.0, 12.05, NOW),
            alert("b", 49.5, 12.50, NOW - 10 * HOUR_MS),
        ];
        let batch = vec![
            alert("a", 48.0, 11.00, NOW),
            alert("b", 47.0, 10.00, NOW),
            alert("c", 46.0, 9.00, NOW),
        ];
        let fresh = dedup(&batch, &prior, NOW);
        assert!(fresh.iter().all(|alert| prior.iter().all(|seen| seen.id != alert.id)));
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id, "c");
    }
}
