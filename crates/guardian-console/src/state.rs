//! Console state store. One `App` value owns everything the UI renders:
//! the job table, the single watched job's telemetry, the on-demand
//! report, and the poll cadences. Fetch results come back as
//! `ConsoleEvent`s and are applied here on the event loop; nothing else
//! mutates state.

use crate::schedule::Cadence;
use chrono::{DateTime, Duration, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use guardian_core::{PhaseLog, ScanJob, ScanReport};

pub const CLOCK_TICK_SECS: i64 = 1;
pub const LIST_POLL_SECS: i64 = 3;
pub const LOG_POLL_SECS: i64 = 3;

/// Fetch work the store wants done. The event loop spawns each command
/// against the API client and feeds the outcome back as a `ConsoleEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchJobs { seq: u64, silent: bool },
    FetchLogs { job_id: i64, seq: u64, initial: bool },
    FetchReport { job_id: i64 },
    Cancel { job_id: i64 },
}

/// Completed fetch, tagged with the sequence number of the request that
/// started it so a slow stale response can never overwrite newer state.
#[derive(Debug, Clone)]
pub enum ConsoleEvent {
    Jobs {
        seq: u64,
        silent: bool,
        result: Result<Vec<ScanJob>, String>,
    },
    Logs {
        job_id: i64,
        seq: u64,
        initial: bool,
        result: Result<Vec<PhaseLog>, String>,
    },
    Report {
        job_id: i64,
        result: Result<ScanReport, String>,
    },
    CancelDone {
        job_id: i64,
        result: Result<(), String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Jobs,
    Detail,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSection {
    Overview,
    Findings,
    Environment,
    Fixes,
    Verification,
}

impl ReportSection {
    pub const ALL: [ReportSection; 5] = [
        ReportSection::Overview,
        ReportSection::Findings,
        ReportSection::Environment,
        ReportSection::Fixes,
        ReportSection::Verification,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ReportSection::Overview => "Overview",
            ReportSection::Findings => "Findings",
            ReportSection::Environment => "Environment",
            ReportSection::Fixes => "Fixes",
            ReportSection::Verification => "Verification",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ReportSection::Overview => ReportSection::Findings,
            ReportSection::Findings => ReportSection::Environment,
            ReportSection::Environment => ReportSection::Fixes,
            ReportSection::Fixes => ReportSection::Verification,
            ReportSection::Verification => ReportSection::Overview,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ReportSection::Overview => ReportSection::Verification,
            ReportSection::Findings => ReportSection::Overview,
            ReportSection::Environment => ReportSection::Findings,
            ReportSection::Fixes => ReportSection::Environment,
            ReportSection::Verification => ReportSection::Fixes,
        }
    }
}

/// Telemetry for the one job currently inspected.
#[derive(Debug, Clone)]
pub struct WatchedJob {
    pub job_id: i64,
    pub logs: Vec<PhaseLog>,
}

#[derive(Debug, Clone)]
pub enum ReportState {
    Idle,
    Loading { job_id: i64 },
    Loaded { job_id: i64, report: ScanReport },
    Failed { job_id: i64, message: String },
}

pub struct App {
    pub jobs: Vec<ScanJob>,
    pub loading: bool,
    pub list_error: Option<String>,
    pub selected: usize,
    pub watched: Option<WatchedJob>,
    pub report: ReportState,
    pub view: View,
    pub report_section: ReportSection,
    pub alert: Option<String>,
    pub status_note: Option<String>,
    pub now: DateTime<Utc>,
    pub should_quit: bool,

    clock_cadence: Cadence,
    list_cadence: Cadence,
    log_cadence: Cadence,

    jobs_seq: u64,
    jobs_applied: u64,
    logs_seq: u64,
    logs_applied: u64,

    pending: Vec<Command>,
}

impl App {
    pub fn new(now: DateTime<Utc>) -> Self {
        let mut clock_cadence = Cadence::new(Duration::seconds(CLOCK_TICK_SECS));
        let mut list_cadence = Cadence::new(Duration::seconds(LIST_POLL_SECS));
        clock_cadence.start(now);
        list_cadence.start(now);

        let mut app = Self {
            jobs: Vec::new(),
            loading: false,
            list_error: None,
            selected: 0,
            watched: None,
            report: ReportState::Idle,
            view: View::Jobs,
            report_section: ReportSection::Overview,
            alert: None,
            status_note: None,
            now,
            should_quit: false,
            clock_cadence,
            list_cadence,
            log_cadence: Cadence::new(Duration::seconds(LOG_POLL_SECS)),
            jobs_seq: 0,
            jobs_applied: 0,
            logs_seq: 0,
            logs_applied: 0,
            pending: Vec::new(),
        };
        // the mount fetch is user-visible; background polls after it are not
        app.refresh(false);
        app
    }

    /// Drains the fetch work queued since the last drain.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.pending)
    }

    /// Advances every cadence to `now`. Durations track the clock tick;
    /// list and log polls queue their periodic fetches.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if self.clock_cadence.poll(now) {
            self.now = now;
        }
        if self.list_cadence.poll(now) {
            self.refresh(true);
        }
        if let Some(watched) = &self.watched {
            let job_id = watched.job_id;
            if self.log_cadence.poll(now) {
                self.logs_seq += 1;
                self.pending.push(Command::FetchLogs {
                    job_id,
                    seq: self.logs_seq,
                    initial: false,
                });
            }
        }
    }

    /// Queues a full job-table fetch. A non-silent refresh drives the
    /// loading/error flags; a silent one touches neither whatever happens.
    pub fn refresh(&mut self, silent: bool) {
        self.jobs_seq += 1;
        if !silent {
            self.loading = true;
        }
        self.pending.push(Command::FetchJobs {
            seq: self.jobs_seq,
            silent,
        });
    }

    pub fn selected_job(&self) -> Option<&ScanJob> {
        self.jobs.get(self.selected)
    }

    pub fn watched_job(&self) -> Option<&ScanJob> {
        let watched = self.watched.as_ref()?;
        self.jobs.iter().find(|job| job.id == watched.job_id)
    }

    /// Starts inspecting one job: initial log fetch now, then on cadence.
    /// Watching a different job tears the previous cadence down first.
    pub fn watch(&mut self, job_id: i64, now: DateTime<Utc>) {
        self.log_cadence.stop();
        self.watched = Some(WatchedJob {
            job_id,
            logs: Vec::new(),
        });
        self.logs_seq += 1;
        self.pending.push(Command::FetchLogs {
            job_id,
            seq: self.logs_seq,
            initial: true,
        });
        self.log_cadence.start(now);
    }

    pub fn unwatch(&mut self) {
        self.watched = None;
        self.log_cadence.stop();
    }

    /// Single on-demand report fetch; never polled.
    pub fn open_report(&mut self, job_id: i64) {
        self.report = ReportState::Loading { job_id };
        self.report_section = ReportSection::Overview;
        self.view = View::Report;
        self.pending.push(Command::FetchReport { job_id });
    }

    /// Cancel is only offered for jobs the pipeline has not picked up yet.
    pub fn cancel_selected(&mut self) {
        let Some(job) = self.selected_job() else {
            return;
        };
        if !job.status.is_cancellable() {
            return;
        }
        let job_id = job.id;
        self.status_note = Some(format!("cancelling scan #{job_id}"));
        self.pending.push(Command::Cancel { job_id });
    }

    pub fn apply_event(&mut self, event: ConsoleEvent) {
        match event {
            ConsoleEvent::Jobs {
                seq,
                silent,
                result,
            } => self.apply_jobs(seq, silent, result),
            ConsoleEvent::Logs {
                job_id,
                seq,
                initial,
                result,
            } => self.apply_logs(job_id, seq, initial, result),
            ConsoleEvent::Report { job_id, result } => self.apply_report(job_id, result),
            ConsoleEvent::CancelDone { job_id, result } => self.apply_cancel(job_id, result),
        }
    }

    fn apply_jobs(&mut self, seq: u64, silent: bool, result: Result<Vec<ScanJob>, String>) {
        if !silent {
            self.loading = false;
            self.list_error = match &result {
                Ok(_) => None,
                Err(message) => Some(message.clone()),
            };
        }
        match result {
            Ok(jobs) => {
                if seq <= self.jobs_applied {
                    tracing::debug!(seq, "dropping stale job snapshot");
                    return;
                }
                self.jobs_applied = seq;
                self.jobs = jobs;
                if !self.jobs.is_empty() && self.selected >= self.jobs.len() {
                    self.selected = self.jobs.len() - 1;
                }
            }
            Err(message) => {
                if silent {
                    tracing::debug!(error = %message, "background list poll failed");
                }
            }
        }
    }

    fn apply_logs(
        &mut self,
        job_id: i64,
        seq: u64,
        initial: bool,
        result: Result<Vec<PhaseLog>, String>,
    ) {
        let Some(watched) = self.watched.as_mut() else {
            return;
        };
        if watched.job_id != job_id {
            return;
        }
        if seq <= self.logs_applied {
            tracing::debug!(seq, job_id, "dropping stale log snapshot");
            return;
        }
        match result {
            Ok(logs) => {
                self.logs_applied = seq;
                watched.logs = logs;
            }
            Err(message) => {
                if initial {
                    // stale rows from a previous job would be worse than an
                    // honest empty state
                    self.logs_applied = seq;
                    watched.logs.clear();
                } else {
                    tracing::debug!(error = %message, job_id, "log poll failed; keeping last good list");
                }
            }
        }
    }

    fn apply_report(&mut self, job_id: i64, result: Result<ScanReport, String>) {
        let expected = match &self.report {
            ReportState::Loading { job_id } => *job_id,
            _ => return,
        };
        if expected != job_id {
            return;
        }
        self.report = match result {
            Ok(report) => ReportState::Loaded { job_id, report },
            Err(message) => ReportState::Failed { job_id, message },
        };
    }

    fn apply_cancel(&mut self, job_id: i64, result: Result<(), String>) {
        match result {
            Ok(()) => {
                self.status_note = Some(format!("scan #{job_id} cancelled"));
                // show the new status now instead of waiting out the tick
                self.refresh(true);
            }
            Err(message) => {
                self.alert = Some(format!("Cancel failed for scan #{job_id}: {message}"));
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.alert = None;
            }
            return;
        }
        match self.view {
            View::Jobs => self.handle_jobs_key(key),
            View::Detail => self.handle_detail_key(key),
            View::Report => self.handle_report_key(key),
        }
    }

    fn handle_jobs_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_prev(),
            KeyCode::Char('r') => self.refresh(false),
            KeyCode::Char('c') => self.cancel_selected(),
            KeyCode::Enter => {
                if let Some(job) = self.selected_job() {
                    let job_id = job.id;
                    self.view = View::Detail;
                    self.watch(job_id, self.now);
                }
            }
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                self.unwatch();
                self.view = View::Jobs;
            }
            KeyCode::Char('c') => self.cancel_selected(),
            KeyCode::Enter | KeyCode::Char('o') => {
                if let Some(watched) = &self.watched {
                    self.open_report(watched.job_id);
                }
            }
            _ => {}
        }
    }

    fn handle_report_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                self.report = ReportState::Idle;
                self.view = View::Detail;
            }
            KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right => {
                self.report_section = self.report_section.next();
            }
            KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Left => {
                self.report_section = self.report_section.prev();
            }
            _ => {}
        }
    }

    fn select_next(&mut self) {
        if !self.jobs.is_empty() && self.selected + 1 < self.jobs.len() {
            self.selected += 1;
        }
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use guardian_core::ScanStatus;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn job(id: i64, status: ScanStatus) -> ScanJob {
        ScanJob {
            id,
            repo: format!("repo-{id}"),
            status,
            created_at: at(0),
            ended_at: None,
            tokens_used: 0,
            pr_number: 0,
            commit_sha: String::new(),
        }
    }

    fn log(step: &str) -> PhaseLog {
        PhaseLog {
            step: step.to_string(),
            ..PhaseLog::default()
        }
    }

    #[test]
    fn mount_issues_a_loud_fetch() {
        let mut app = App::new(at(100));
        assert!(app.loading);
        assert_eq!(
            app.take_commands(),
            vec![Command::FetchJobs {
                seq: 1,
                silent: false,
            }]
        );
    }

    #[test]
    fn loud_refresh_drives_flags_and_silent_does_not() {
        let mut app = App::new(at(100));
        app.take_commands();
        app.apply_event(ConsoleEvent::Jobs {
            seq: 1,
            silent: false,
            result: Err("connection refused".to_string()),
        });
        assert!(!app.loading);
        assert_eq!(app.list_error.as_deref(), Some("connection refused"));

        // background failure leaves both flags untouched
        app.refresh(true);
        app.apply_event(ConsoleEvent::Jobs {
            seq: 2,
            silent: true,
            result: Err("timeout".to_string()),
        });
        assert_eq!(app.list_error.as_deref(), Some("connection refused"));

        // background success replaces the table without clearing the error
        app.refresh(true);
        app.apply_event(ConsoleEvent::Jobs {
            seq: 3,
            silent: true,
            result: Ok(vec![job(1, ScanStatus::Pending)]),
        });
        assert_eq!(app.jobs.len(), 1);
        assert_eq!(app.list_error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn stale_job_snapshot_is_discarded() {
        let mut app = App::new(at(100));
        app.take_commands();
        app.refresh(true);
        app.refresh(true);
        app.apply_event(ConsoleEvent::Jobs {
            seq: 3,
            silent: true,
            result: Ok(vec![job(1, ScanStatus::Running), job(2, ScanStatus::Queued)]),
        });
        // the slow response to the earlier poll lands afterwards
        app.apply_event(ConsoleEvent::Jobs {
            seq: 2,
            silent: true,
            result: Ok(vec![job(1, ScanStatus::Pending)]),
        });
        assert_eq!(app.jobs.len(), 2);
        assert_eq!(app.jobs[0].status, ScanStatus::Running);
    }

    #[test]
    fn snapshot_replace_drops_vanished_jobs() {
        let mut app = App::new(at(100));
        app.take_commands();
        app.apply_event(ConsoleEvent::Jobs {
            seq: 1,
            silent: false,
            result: Ok(vec![job(1, ScanStatus::Pending), job(2, ScanStatus::Queued)]),
        });
        app.selected = 1;
        app.apply_event(ConsoleEvent::Jobs {
            seq: 2,
            silent: true,
            result: Ok(vec![job(2, ScanStatus::Queued)]),
        });
        assert_eq!(app.jobs.len(), 1);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn list_cadence_polls_every_three_seconds() {
        let mut app = App::new(at(100));
        app.take_commands();
        app.tick(at(101));
        assert!(app.take_commands().is_empty());
        app.tick(at(103));
        assert_eq!(
            app.take_commands(),
            vec![Command::FetchJobs {
                seq: 2,
                silent: true,
            }]
        );
    }

    #[test]
    fn clock_tick_advances_now() {
        let mut app = App::new(at(100));
        app.tick(at(100)); // same instant: cadence not due yet
        assert_eq!(app.now, at(100));
        app.tick(at(101));
        assert_eq!(app.now, at(101));
    }

    #[test]
    fn watch_fetches_immediately_then_on_cadence() {
        let mut app = App::new(at(100));
        app.take_commands();
        app.watch(7, at(100));
        assert_eq!(
            app.take_commands(),
            vec![Command::FetchLogs {
                job_id: 7,
                seq: 1,
                initial: true,
            }]
        );
        app.tick(at(103));
        let commands = app.take_commands();
        assert!(commands.contains(&Command::FetchLogs {
            job_id: 7,
            seq: 2,
            initial: false,
        }));
    }

    #[test]
    fn initial_log_failure_empties_the_list() {
        let mut app = App::new(at(100));
        app.take_commands();
        app.watch(7, at(100));
        app.apply_event(ConsoleEvent::Logs {
            job_id: 7,
            seq: 1,
            initial: true,
            result: Err("boom".to_string()),
        });
        assert!(app.watched.as_ref().unwrap().logs.is_empty());
    }

    #[test]
    fn periodic_log_failure_keeps_the_last_good_list() {
        let mut app = App::new(at(100));
        app.take_commands();
        app.watch(7, at(100));
        app.apply_event(ConsoleEvent::Logs {
            job_id: 7,
            seq: 1,
            initial: true,
            result: Ok(vec![log("Remediation")]),
        });
        app.apply_event(ConsoleEvent::Logs {
            job_id: 7,
            seq: 2,
            initial: false,
            result: Err("boom".to_string()),
        });
        assert_eq!(app.watched.as_ref().unwrap().logs.len(), 1);
    }

    #[test]
    fn switching_watched_job_drops_responses_for_the_old_one() {
        let mut app = App::new(at(100));
        app.take_commands();
        app.watch(7, at(100));
        app.watch(8, at(101));
        app.apply_event(ConsoleEvent::Logs {
            job_id: 7,
            seq: 1,
            initial: true,
            result: Ok(vec![log("Remediation")]),
        });
        assert!(app.watched.as_ref().unwrap().logs.is_empty());
        app.apply_event(ConsoleEvent::Logs {
            job_id: 8,
            seq: 2,
            initial: true,
            result: Ok(vec![log("Verification")]),
        });
        assert_eq!(app.watched.as_ref().unwrap().logs[0].step, "Verification");
    }

    #[test]
    fn unwatch_stops_the_log_cadence() {
        let mut app = App::new(at(100));
        app.take_commands();
        app.watch(7, at(100));
        app.take_commands();
        app.unwatch();
        app.tick(at(110));
        let commands = app.take_commands();
        assert!(commands
            .iter()
            .all(|command| !matches!(command, Command::FetchLogs { .. })));
    }

    #[test]
    fn successful_cancel_triggers_an_immediate_silent_refresh() {
        let mut app = App::new(at(100));
        app.take_commands();
        app.apply_event(ConsoleEvent::Jobs {
            seq: 1,
            silent: false,
            result: Ok(vec![job(5, ScanStatus::Queued)]),
        });
        app.cancel_selected();
        assert_eq!(app.take_commands(), vec![Command::Cancel { job_id: 5 }]);
        app.apply_event(ConsoleEvent::CancelDone {
            job_id: 5,
            result: Ok(()),
        });
        assert_eq!(
            app.take_commands(),
            vec![Command::FetchJobs {
                seq: 2,
                silent: true,
            }]
        );
        assert!(app.alert.is_none());
    }

    #[test]
    fn failed_cancel_raises_a_blocking_alert_and_changes_nothing() {
        let mut app = App::new(at(100));
        app.take_commands();
        app.apply_event(ConsoleEvent::Jobs {
            seq: 1,
            silent: false,
            result: Ok(vec![job(5, ScanStatus::Pending)]),
        });
        app.apply_event(ConsoleEvent::CancelDone {
            job_id: 5,
            result: Err("already running".to_string()),
        });
        assert!(app.alert.is_some());
        assert!(app.take_commands().is_empty());

        // alert swallows navigation keys until dismissed
        app.handle_key(KeyEvent::from(KeyCode::Char('j')));
        assert_eq!(app.selected, 0);
        app.handle_key(KeyEvent::from(KeyCode::Esc));
        assert!(app.alert.is_none());
    }

    #[test]
    fn terminal_jobs_are_not_cancellable() {
        let mut app = App::new(at(100));
        app.take_commands();
        app.apply_event(ConsoleEvent::Jobs {
            seq: 1,
            silent: false,
            result: Ok(vec![job(5, ScanStatus::Finished)]),
        });
        app.cancel_selected();
        assert!(app.take_commands().is_empty());
    }

    #[test]
    fn report_failure_is_scoped_to_the_requested_job() {
        let mut app = App::new(at(100));
        app.take_commands();
        app.open_report(3);
        app.apply_event(ConsoleEvent::Report {
            job_id: 9,
            result: Ok(ScanReport::default()),
        });
        assert!(matches!(app.report, ReportState::Loading { job_id: 3 }));
        app.apply_event(ConsoleEvent::Report {
            job_id: 3,
            result: Err("404".to_string()),
        });
        assert!(matches!(app.report, ReportState::Failed { job_id: 3, .. }));
    }
}
