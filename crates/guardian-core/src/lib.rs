//! Contracts and pure derivations for the guardian scan console.
//!
//! Everything in this crate is IO-free: wire payload shapes for the scan
//! API plus the derivations the console applies to them (elapsed time,
//! token reconciliation, report views, pipeline health, verification log
//! parsing).

pub mod duration;
pub mod model;
pub mod report;
pub mod tokens;
pub mod verify_log;

pub use model::{
    ConfigEntry, EcosystemSection, PhaseLog, RemediationEntry, ScanJob, ScanReport, ScanStatus,
    ScannerSection, Severity, VerificationEntry, Vulnerability,
};
pub use report::{PipelineStage, ReportView, StageState};
pub use verify_log::TestOutcome;
