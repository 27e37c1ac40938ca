//! Cron-driven run loop.
//!
//! Runs never overlap: the next fire time is computed only after the
//! previous run returned, so fire times missed during a long run are
//! skipped rather than queued.

use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use tracing::{info, warn};

use nebula_core::Synchronizer;

pub async fn run_scheduled(synchronizer: &Synchronizer, schedule: &Schedule) {
    loop {
        let Some(wait) = next_delay(schedule, Utc::now()) else {
            warn!("schedule has no upcoming fire times");
            return;
        };
        info!(
            next_run_in = %humantime::format_duration(Duration::from_secs(wait.as_secs())),
            "waiting for next scheduled sync"
        );
        tokio::time::sleep(wait).await;

        // Failures are logged and recorded by the synchronizer's callbacks.
        let _ = synchronizer.run().await;
    }
}

/// Time from `now` until the next fire time, if any.
pub fn next_delay(schedule: &Schedule, now: DateTime<Utc>) -> Option<Duration> {
    let next = schedule.after(&now).next()?;
    Some((next - now).to_std().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::str::FromStr;

    use chrono::TimeZone;

    use super::*;

    #[test]
    fn delay_until_next_quarter_hour() {
        let schedule = Schedule::from_str("0 */15 * * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 7, 30).unwrap();

        assert_eq!(next_delay(&schedule, now), Some(Duration::from_secs(450)));
    }

    #[test]
    fn fire_time_equal_to_now_is_skipped() {
        let schedule = Schedule::from_str("0 0 * * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();

        assert_eq!(next_delay(&schedule, now), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn exhausted_schedule_has_no_delay() {
        let schedule = Schedule::from_str("0 0 0 1 1 * 2020").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();

        assert_eq!(next_delay(&schedule, now), None);
    }
}
