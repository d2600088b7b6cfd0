//! Human-readable rendering of a [`WorkflowReport`]

use std::fmt::Write;

use crate::types::{PlatformResult, WorkflowReport};

const RULE: &str = "==================================================";

/// Rough failure class guessed from an error message, used only to pick a hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Authentication,
    Network,
    ImageSize,
    Other,
}

impl FailureCategory {
    /// Classify `message` by keyword. Best effort: unknown wording is `Other`.
    pub fn detect(message: &str) -> Self {
        let message = message.to_lowercase();
        let any = |needles: &[&str]| needles.iter().any(|n| message.contains(n));

        if any(&[
            "authenticat",
            "oauth",
            "token",
            "credential",
            "permission",
            "unauthorized",
            "forbidden",
            "401",
            "403",
        ]) {
            FailureCategory::Authentication
        } else if any(&[
            "network",
            "timed out",
            "timeout",
            "connection",
            "dns",
            "unreachable",
        ]) {
            FailureCategory::Network
        } else if any(&[
            "too large",
            "too big",
            "file size",
            "dimension",
            "aspect ratio",
            "resolution",
        ]) {
            FailureCategory::ImageSize
        } else {
            FailureCategory::Other
        }
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self {
            FailureCategory::Authentication => Some(
                "Check the platform credentials in your config file and run postboi-check",
            ),
            FailureCategory::Network => {
                Some("Check your internet connection and try again in a few minutes")
            }
            FailureCategory::ImageSize => {
                Some("Try a smaller image or reduce its resolution before posting")
            }
            FailureCategory::Other => None,
        }
    }
}

/// Render `report` as a fixed-format text block.
///
/// ```text
/// ==================================================
/// PUBLISHING SUMMARY
/// ==================================================
///
/// SUCCESSFUL (1/2):
///   ✓ WordPress: https://blog.example.com/?p=42
///
/// FAILED (1/2):
///   ✗ Facebook: Network error: connection reset
///     Attempt 1: Network error: connection reset
///     Hint: Check your internet connection and try again in a few minutes
/// ```
pub fn summarize(report: &WorkflowReport) -> String {
    let total = report.total();
    let mut out = String::new();

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "PUBLISHING SUMMARY");
    let _ = writeln!(out, "{}", RULE);

    if report.succeeded_count > 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "SUCCESSFUL ({}/{}):", report.succeeded_count, total);
        for result in report.successes() {
            let _ = writeln!(
                out,
                "  ✓ {}: {}",
                result.platform.display_name(),
                result.detail
            );
            if !result.attempts.is_empty() {
                let _ = writeln!(
                    out,
                    "    (after {} failed attempt{})",
                    result.attempts.len(),
                    if result.attempts.len() == 1 { "" } else { "s" }
                );
            }
        }
    }

    if report.failed_count > 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "FAILED ({}/{}):", report.failed_count, total);
        for result in report.failures() {
            write_failure(&mut out, result);
        }
    }

    if total == 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "No platforms were published to.");
    }

    out
}

fn write_failure(out: &mut String, result: &PlatformResult) {
    let _ = writeln!(
        out,
        "  ✗ {}: {}",
        result.platform.display_name(),
        result.detail
    );
    for attempt in &result.attempts {
        let _ = writeln!(
            out,
            "    Attempt {} ({}): {}",
            attempt.attempt_number,
            attempt.timestamp.format("%H:%M:%S"),
            attempt.error_message
        );
    }
    if let Some(hint) = FailureCategory::detect(&result.detail).hint() {
        let _ = writeln!(out, "    Hint: {}", hint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttemptRecord, PlatformKind};
    use std::collections::BTreeMap;

    fn report(results: Vec<PlatformResult>) -> WorkflowReport {
        WorkflowReport::new(
            results
                .into_iter()
                .map(|r| (r.platform, r))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn test_detect_categories() {
        assert_eq!(
            FailureCategory::detect("Invalid OAuth access token."),
            FailureCategory::Authentication
        );
        assert_eq!(
            FailureCategory::detect("Network error: connection reset by peer"),
            FailureCategory::Network
        );
        assert_eq!(
            FailureCategory::detect("Image is too large for this endpoint"),
            FailureCategory::ImageSize
        );
        assert_eq!(FailureCategory::detect("Something odd"), FailureCategory::Other);
    }

    #[test]
    fn test_words_containing_auth_are_not_credential_failures() {
        assert_eq!(
            FailureCategory::detect("Posting failed: author field missing"),
            FailureCategory::Other
        );
        assert_eq!(
            FailureCategory::detect("Content validation failed: unknown authority"),
            FailureCategory::Other
        );
        assert_eq!(
            FailureCategory::detect("Authentication failed: WordPress rejected the login"),
            FailureCategory::Authentication
        );
        assert_eq!(
            FailureCategory::detect("OAuthException: session expired"),
            FailureCategory::Authentication
        );
    }

    #[test]
    fn test_summary_sections() {
        let report = report(vec![
            PlatformResult::succeeded(PlatformKind::Blog, "https://blog.example.com/?p=1", vec![]),
            PlatformResult::failed(
                PlatformKind::Page,
                "Network error: timed out",
                vec![
                    AttemptRecord::new(1, "Network error: timed out"),
                    AttemptRecord::new(2, "Network error: timed out"),
                ],
            ),
        ]);

        let text = summarize(&report);
        assert!(text.contains("PUBLISHING SUMMARY"));
        assert!(text.contains("SUCCESSFUL (1/2):"));
        assert!(text.contains("WordPress: https://blog.example.com/?p=1"));
        assert!(text.contains("FAILED (1/2):"));
        assert!(text.contains("Facebook: Network error: timed out"));
        assert!(text.contains("Attempt 1"));
        assert!(text.contains("Attempt 2"));
        assert!(text.contains("Hint:"));
    }

    #[test]
    fn test_all_success_has_no_failed_section() {
        let report = report(vec![PlatformResult::succeeded(
            PlatformKind::BusinessAccount,
            "Posted to Instagram: 1789",
            vec![AttemptRecord::new(1, "Network error")],
        )]);

        let text = summarize(&report);
        assert!(text.contains("SUCCESSFUL (1/1):"));
        assert!(text.contains("after 1 failed attempt"));
        assert!(!text.contains("FAILED"));
    }

    #[test]
    fn test_unrecognized_failure_has_no_hint() {
        let report = report(vec![PlatformResult::failed(
            PlatformKind::Blog,
            "Posting failed: teapot",
            vec![],
        )]);
        assert!(!summarize(&report).contains("Hint:"));
    }
}
