//! Best-effort extraction of per-test results from an unstructured
//! verification log. The sandbox runner hands back whatever the test
//! runner printed; this pulls out `FAIL:`/`ERROR:` lines and falls back to
//! a single synthetic pass entry when the blob ends in a bare `OK`.
//! Anything that doesn't match simply yields no entries.

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub name: String,
    pub passed: bool,
}

pub const ALL_TESTS_PASSED: &str = "all tests passed";

/// One failure entry per `FAIL:`/`ERROR:` line naming a bare identifier.
/// A blob with no such lines but containing `OK` gets one synthetic pass
/// entry; everything else yields an empty list.
pub fn parse_verification_log(blob: &str) -> Vec<TestOutcome> {
    let marker = Regex::new(r"(?:FAIL|ERROR):\s*([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex");

    let mut outcomes: Vec<TestOutcome> = Vec::new();
    for line in blob.lines() {
        if let Some(captures) = marker.captures(line) {
            outcomes.push(TestOutcome {
                name: captures[1].to_string(),
                passed: false,
            });
        }
    }

    if outcomes.is_empty() && blob.contains("OK") {
        outcomes.push(TestOutcome {
            name: ALL_TESTS_PASSED.to_string(),
            passed: true,
        });
    }

    outcomes
}
