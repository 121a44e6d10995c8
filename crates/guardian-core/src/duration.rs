//! Elapsed-time display for job rows. `now` is injected by the caller's
//! clock tick so the math stays deterministic under test.

use crate::model::ScanJob;
use chrono::{DateTime, Utc};

/// Seconds elapsed for a job at instant `now`. Freezes at `ended_at` once
/// the job is terminal; clamps clock skew to zero. Jobs that are terminal
/// but never recorded an end time (legacy rows) report zero.
pub fn elapsed_secs(job: &ScanJob, now: DateTime<Utc>) -> i64 {
    let elapsed = if let Some(ended_at) = job.ended_at {
        ended_at - job.created_at
    } else if job.status.is_active() {
        now - job.created_at
    } else {
        return 0;
    };
    elapsed.num_seconds().max(0)
}

/// `HH:MM:SS`, zero padded, hours uncapped.
pub fn format_hms(total_secs: i64) -> String {
    let total_secs = total_secs.max(0);
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

pub fn duration_display(job: &ScanJob, now: DateTime<Utc>) -> String {
    format_hms(elapsed_secs(job, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScanStatus;
    use chrono::TimeZone;

    fn job(status: ScanStatus, created_secs: i64, ended_secs: Option<i64>) -> ScanJob {
        ScanJob {
            id: 1,
            repo: "git@example.com:demo/repo".to_string(),
            status,
            created_at: Utc.timestamp_opt(created_secs, 0).unwrap(),
            ended_at: ended_secs.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
            tokens_used: 0,
            pr_number: 0,
            commit_sha: String::new(),
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn pending_job_tracks_the_live_clock() {
        let job = job(ScanStatus::Pending, 1_000, None);
        assert_eq!(duration_display(&job, at(1_065)), "00:01:05");
    }

    #[test]
    fn ended_job_ignores_now() {
        let job = job(ScanStatus::Finished, 1_000, Some(1_090));
        assert_eq!(duration_display(&job, at(1_100)), "00:01:30");
        assert_eq!(duration_display(&job, at(9_999_999)), "00:01:30");
    }

    #[test]
    fn live_duration_is_monotonic() {
        let job = job(ScanStatus::Queued, 1_000, None);
        let mut last = -1;
        for now in [1_000, 1_001, 1_500, 10_000] {
            let secs = elapsed_secs(&job, at(now));
            assert!(secs >= last);
            last = secs;
        }
    }

    #[test]
    fn clock_skew_clamps_to_zero() {
        let job = job(ScanStatus::Running, 2_000, None);
        assert_eq!(duration_display(&job, at(1_500)), "00:00:00");
    }

    #[test]
    fn terminal_without_end_time_reports_zero() {
        let job = job(ScanStatus::Failed, 1_000, None);
        assert_eq!(duration_display(&job, at(5_000)), "00:00:00");
    }

    #[test]
    fn hours_are_not_capped() {
        assert_eq!(format_hms(26 * 3600 + 61), "26:01:01");
        assert_eq!(format_hms(0), "00:00:00");
    }
}
