use super::reviewers::{format_elapsed, ReviewOutcome};

pub const REPORT_HEADER: &str = "## 🧠 AI Council Plan Review";

#[derive(Debug, Clone)]
pub struct AggregatedReport {
    pub outcomes: Vec<ReviewOutcome>,
    pub summary: String,
}

impl AggregatedReport {
    pub fn completed(&self) -> usize {
        count_completed(&self.outcomes)
    }
}

fn count_completed(outcomes: &[ReviewOutcome]) -> usize {
    outcomes.iter().filter(|o| o.succeeded()).count()
}

/// Render the council report. Sections follow the order of `outcomes`.
pub fn build_report(outcomes: Vec<ReviewOutcome>) -> AggregatedReport {
    let mut out = String::new();

    out.push_str(REPORT_HEADER);
    out.push_str("\n\n");
    out.push_str(
        "Your plan has been reviewed by three AI models. Consider their feedback before finalizing.\n\n",
    );
    out.push_str("---\n\n");

    for outcome in &outcomes {
        let icon = if outcome.succeeded() { "✅" } else { "⚠️" };
        out.push_str(&format!(
            "### {} {} ({})\n\n",
            icon,
            outcome.reviewer,
            format_elapsed(outcome.elapsed)
        ));

        if let Some(err) = &outcome.error {
            out.push_str(&format!("*Error: {}*\n\n", err));
        }

        out.push_str(&outcome.feedback);
        out.push_str("\n\n---\n\n");
    }

    out.push_str(&format!(
        "**Reviews completed:** {}/{}\n",
        count_completed(&outcomes),
        outcomes.len()
    ));

    AggregatedReport {
        outcomes,
        summary: out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan_review::reviewers::ReviewError;
    use std::time::Duration;

    fn ok(name: &str, feedback: &str, secs: u64) -> ReviewOutcome {
        ReviewOutcome {
            reviewer: name.into(),
            feedback: feedback.into(),
            error: None,
            elapsed: Duration::from_secs(secs),
        }
    }

    fn timed_out(name: &str) -> ReviewOutcome {
        let err = ReviewError::TimedOut {
            label: "Gemini",
            limit: Duration::from_secs(60),
        };
        ReviewOutcome {
            reviewer: name.into(),
            feedback: err.placeholder(),
            error: Some(err),
            elapsed: Duration::from_secs(60),
        }
    }

    #[test]
    fn two_of_three_with_timeout_notice() {
        let report = build_report(vec![
            ok("Claude Opus 4.5", "Looks solid.", 42),
            ok("o3 (Codex)", "Consider caching.", 75),
            timed_out("Gemini 2.5 Pro"),
        ]);

        assert_eq!(report.completed(), 2);
        let s = &report.summary;
        assert!(s.starts_with(REPORT_HEADER));
        assert!(s.contains("### ✅ Claude Opus 4.5 (42s)"));
        assert!(s.contains("### ✅ o3 (Codex) (1m15s)"));
        assert!(s.contains("### ⚠️ Gemini 2.5 Pro (1m0s)"));
        assert!(s.contains("*Error: Gemini review timed out (60s)*"));
        assert!(s.contains("Looks solid."));
        assert!(s.contains("Consider caching."));
        assert!(s.contains("⚠️ Gemini review timed out"));
        assert!(s.trim_end().ends_with("**Reviews completed:** 2/3"));
    }

    #[test]
    fn sections_keep_input_order() {
        let report = build_report(vec![
            ok("first", "a", 1),
            ok("second", "b", 1),
            ok("third", "c", 1),
        ]);
        let s = &report.summary;
        let first = s.find("### ✅ first").unwrap();
        let second = s.find("### ✅ second").unwrap();
        let third = s.find("### ✅ third").unwrap();
        assert!(first < second && second < third);
        assert!(s.contains("**Reviews completed:** 3/3"));
    }

    #[test]
    fn successful_sections_have_no_error_line() {
        let report = build_report(vec![ok("Claude Opus 4.5", "fine", 3)]);
        assert!(!report.summary.contains("*Error:"));
    }

    #[test]
    fn count_line_matches_completed() {
        let report = build_report(vec![
            timed_out("Claude Opus 4.5"),
            ok("o3 (Codex)", "ok", 2),
            timed_out("Gemini 2.5 Pro"),
        ]);
        assert_eq!(report.completed(), 1);
        assert!(report.summary.contains(&format!(
            "**Reviews completed:** {}/{}",
            report.completed(),
            report.outcomes.len()
        )));
    }

    #[test]
    fn empty_council_reports_zero_of_zero() {
        let report = build_report(Vec::new());
        assert_eq!(report.completed(), 0);
        assert!(report.summary.trim_end().ends_with("**Reviews completed:** 0/0"));
    }
}
