//! Read-only views over one report envelope. All derivations are pure and
//! total: a half-filled envelope produces empty views, never errors.

use crate::model::{RemediationEntry, ScanReport, VerificationEntry, Vulnerability};

/// The four stages the console summarizes the pipeline as, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Scan,
    Detect,
    Fix,
    Verify,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 4] = [
        PipelineStage::Scan,
        PipelineStage::Detect,
        PipelineStage::Fix,
        PipelineStage::Verify,
    ];

    pub fn title(self) -> &'static str {
        match self {
            PipelineStage::Scan => "Scan",
            PipelineStage::Detect => "Detect",
            PipelineStage::Fix => "Fix",
            PipelineStage::Verify => "Verify",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Completed,
    Attention,
}

/// Borrowing facade over a fetched envelope.
#[derive(Debug, Clone, Copy)]
pub struct ReportView<'a> {
    report: &'a ScanReport,
}

impl<'a> ReportView<'a> {
    pub fn new(report: &'a ScanReport) -> Self {
        Self { report }
    }

    /// The summary object is the last thing the pipeline writes; until it
    /// has keys the report counts as not generated yet.
    pub fn is_generated(&self) -> bool {
        !self.report.report.is_empty()
    }

    pub fn error(&self) -> Option<&'a str> {
        self.report.error.as_deref()
    }

    /// Scalar summary counts written by the final pipeline phase.
    pub fn summary(&self) -> &'a serde_json::Map<String, serde_json::Value> {
        &self.report.report
    }

    pub fn vulnerabilities(&self) -> &'a [Vulnerability] {
        self.report
            .scanner
            .as_ref()
            .map(|scanner| scanner.vulnerabilities.as_slice())
            .unwrap_or(&[])
    }

    /// `detected_libraries` flattened to (language, package) pairs for
    /// tagging.
    pub fn detected_libraries(&self) -> Vec<(&'a str, &'a str)> {
        let Some(scanner) = self.report.scanner.as_ref() else {
            return Vec::new();
        };
        scanner
            .detected_libraries
            .iter()
            .flat_map(|(language, packages)| {
                packages
                    .iter()
                    .map(move |package| (language.as_str(), package.as_str()))
            })
            .collect()
    }

    pub fn ecosystem(&self) -> Option<&'a crate::model::EcosystemSection> {
        self.report.ecosystem.as_ref()
    }

    pub fn remediation(&self) -> &'a [RemediationEntry] {
        &self.report.remediation
    }

    pub fn remediation_count(&self) -> usize {
        self.report.remediation.len()
    }

    pub fn verification(&self) -> &'a [VerificationEntry] {
        &self.report.verification
    }

    pub fn verification_total(&self) -> usize {
        self.report.verification.len()
    }

    pub fn verification_passed(&self) -> usize {
        self.report
            .verification
            .iter()
            .filter(|entry| entry.verified)
            .count()
    }

    /// Verification result for one remediated path, when the pipeline got
    /// that far.
    pub fn verification_for(&self, path: &str) -> Option<&'a VerificationEntry> {
        self.report
            .verification
            .iter()
            .find(|entry| entry.path == path)
    }

    /// Display summary, not a state machine: Scan/Detect/Fix always show
    /// completed; only Verify can demand attention, and a vacuous 0/0
    /// verification run counts as completed.
    pub fn stages(&self) -> [(PipelineStage, StageState); 4] {
        let verify = if self.verification_passed() < self.verification_total() {
            StageState::Attention
        } else {
            StageState::Completed
        };
        [
            (PipelineStage::Scan, StageState::Completed),
            (PipelineStage::Detect, StageState::Completed),
            (PipelineStage::Fix, StageState::Completed),
            (PipelineStage::Verify, verify),
        ]
    }
}

/// Language label from the last dot-separated segment of a path, lowered.
/// Unknown extensions get a generic label; the mapping never fails.
pub fn language_for_path(path: &str) -> &'static str {
    let extension = path
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    match extension.as_str() {
        "py" => "python",
        "js" | "jsx" | "mjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "rs" => "rust",
        "go" => "go",
        "java" => "java",
        "rb" => "ruby",
        "php" => "php",
        "c" | "h" => "c",
        "cc" | "cpp" | "hpp" => "c++",
        "sh" => "shell",
        "yml" | "yaml" => "yaml",
        "json" => "json",
        "env" => "env",
        _ => "file",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScannerSection, VerificationEntry};
    use serde_json::json;

    fn report_with_verification(entries: Vec<VerificationEntry>) -> ScanReport {
        ScanReport {
            verification: entries,
            ..ScanReport::default()
        }
    }

    fn verified(path: &str, ok: bool) -> VerificationEntry {
        VerificationEntry {
            path: path.to_string(),
            verified: ok,
            error: None,
        }
    }

    #[test]
    fn empty_envelope_yields_empty_views() {
        let report = ScanReport::default();
        let view = ReportView::new(&report);
        assert!(!view.is_generated());
        assert!(view.vulnerabilities().is_empty());
        assert!(view.detected_libraries().is_empty());
        assert_eq!(view.remediation_count(), 0);
        assert_eq!(view.verification_total(), 0);
    }

    #[test]
    fn summary_keys_mark_the_report_generated() {
        let mut report = ScanReport::default();
        report
            .report
            .insert("total_vulnerabilities".to_string(), json!(3));
        assert!(ReportView::new(&report).is_generated());
    }

    #[test]
    fn libraries_flatten_to_language_package_pairs() {
        let mut scanner = ScannerSection::default();
        scanner.detected_libraries.insert(
            "python".to_string(),
            vec!["flask".to_string(), "requests".to_string()],
        );
        scanner
            .detected_libraries
            .insert("javascript".to_string(), vec!["express".to_string()]);
        let report = ScanReport {
            scanner: Some(scanner),
            ..ScanReport::default()
        };
        let pairs = ReportView::new(&report).detected_libraries();
        assert_eq!(
            pairs,
            vec![
                ("javascript", "express"),
                ("python", "flask"),
                ("python", "requests"),
            ]
        );
    }

    #[test]
    fn verify_stage_needs_attention_only_on_failures() {
        let all_pass = report_with_verification(vec![verified("a.py", true)]);
        let view = ReportView::new(&all_pass);
        assert_eq!(view.stages()[3].1, StageState::Completed);

        let one_fail =
            report_with_verification(vec![verified("a.py", true), verified("b.py", false)]);
        let view = ReportView::new(&one_fail);
        assert_eq!(view.stages()[3].1, StageState::Attention);
        assert!(view.verification_passed() <= view.verification_total());
    }

    #[test]
    fn zero_verifications_count_as_completed() {
        let mut report = report_with_verification(Vec::new());
        report.remediation.push(RemediationEntry {
            path: "a.py".to_string(),
            ..RemediationEntry::default()
        });
        let view = ReportView::new(&report);
        assert_eq!(view.remediation_count(), 1);
        assert_eq!(view.verification_total(), 0);
        assert_eq!(view.stages()[3].1, StageState::Completed);
    }

    #[test]
    fn remediation_without_verification_pairing_is_tolerated() {
        let mut report = report_with_verification(vec![verified("b.py", true)]);
        report.remediation.push(RemediationEntry {
            path: "a.py".to_string(),
            ..RemediationEntry::default()
        });
        let view = ReportView::new(&report);
        assert!(view.verification_for("a.py").is_none());
        assert!(view.verification_for("b.py").is_some());
    }

    #[test]
    fn derivations_are_idempotent() {
        let report =
            report_with_verification(vec![verified("a.py", true), verified("b.py", false)]);
        let view = ReportView::new(&report);
        assert_eq!(view.verification_passed(), view.verification_passed());
        assert_eq!(view.stages(), view.stages());
    }

    #[test]
    fn path_language_mapping_is_case_insensitive_with_default() {
        assert_eq!(language_for_path("src/app.PY"), "python");
        assert_eq!(language_for_path("web/index.tsx"), "typescript");
        assert_eq!(language_for_path("Makefile"), "file");
        assert_eq!(language_for_path("archive.bin"), "file");
    }
}
