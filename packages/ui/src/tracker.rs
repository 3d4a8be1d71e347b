//! Latest device position, fed by the platform location service.

use std::time::Duration;

use store::config::TrackingConfig;
use store::LocationRecord;
use tokio::sync::watch;
use tracing::debug;

/// One position report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    /// Epoch milliseconds.
    pub at: i64,
}

impl Fix {
    /// A new location record placed at this fix.
    pub fn to_record(&self, user_id: &str, name: &str) -> LocationRecord {
        LocationRecord::new(user_id, name, self.latitude, self.longitude)
    }
}

/// Keeps only the most recent fix and rate-limits updates.
pub struct LocationTracker {
    config: TrackingConfig,
    latest: watch::Sender<Option<Fix>>,
}

impl LocationTracker {
    pub fn new(config: TrackingConfig) -> Self {
        let (latest, _) = watch::channel(None);
        Self { config, latest }
    }

    /// Cadence to request from the platform.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.config.interval_ms)
    }

    pub fn fastest_interval(&self) -> Duration {
        Duration::from_millis(self.config.fastest_interval_ms)
    }

    /// Offer a fix. Returns `false` when it was dropped: out-of-range
    /// coordinates, or sooner than the fastest interval after the last one.
    pub fn report(&self, fix: Fix) -> bool {
        let valid = fix.latitude.is_finite()
            && fix.longitude.is_finite()
            && (-90.0..=90.0).contains(&fix.latitude)
            && (-180.0..=180.0).contains(&fix.longitude);
        if !valid {
            debug!(?fix, "dropping invalid fix");
            return false;
        }

        let min_gap = self.config.fastest_interval_ms as i64;
        self.latest.send_if_modified(|latest| match latest {
            Some(prev) if fix.at.saturating_sub(prev.at) < min_gap => {
                debug!(gap_ms = fix.at.saturating_sub(prev.at), "dropping fix, too soon");
                false
            }
            _ => {
                *latest = Some(fix);
                true
            }
        })
    }

    pub fn latest(&self) -> Option<Fix> {
        *self.latest.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Fix>> {
        self.latest.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(at: i64) -> Fix {
        Fix {
            latitude: -26.2041,
            longitude: 28.0473,
            at,
        }
    }

    #[test]
    fn test_rate_limit() {
        let tracker = LocationTracker::new(TrackingConfig::default());
        assert!(tracker.report(fix(10_000)));
        assert!(!tracker.report(fix(11_999)));
        assert_eq!(tracker.latest().unwrap().at, 10_000);
        assert!(tracker.report(fix(12_000)));
        assert_eq!(tracker.latest().unwrap().at, 12_000);
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let tracker = LocationTracker::new(TrackingConfig::default());
        assert!(tracker.report(fix(i64::MAX)));
        assert!(!tracker.report(fix(i64::MIN)));
        assert_eq!(tracker.latest().unwrap().at, i64::MAX);

        let tracker = LocationTracker::new(TrackingConfig::default());
        assert!(tracker.report(fix(i64::MIN)));
        assert!(tracker.report(fix(i64::MAX)));
    }

    #[test]
    fn test_invalid_fix_is_dropped() {
        let tracker = LocationTracker::new(TrackingConfig::default());
        let mut bad = fix(0);
        bad.latitude = 91.0;
        assert!(!tracker.report(bad));
        bad.latitude = f64::NAN;
        assert!(!tracker.report(bad));
        assert!(tracker.latest().is_none());
    }

    #[test]
    fn test_intervals_and_subscribers() {
        let tracker = LocationTracker::new(TrackingConfig::default());
        assert_eq!(tracker.interval(), Duration::from_secs(5));
        assert_eq!(tracker.fastest_interval(), Duration::from_secs(2));

        let mut rx = tracker.subscribe();
        tracker.report(fix(0));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Some(fix(0)));
    }

    #[test]
    fn test_record_at_fix() {
        let record = fix(0).to_record("u1", "Constitution Hill");
        assert_eq!(record.latitude, -26.2041);
        assert_eq!(record.user_id, "u1");
        assert!(record.validate().is_ok());
    }
}
