use std::fmt::Write;

use crate::index::StudentEssayIndex;
use crate::models::raw::GradingFailure;
use crate::models::submission::Submission;
use crate::services::summarize_by_essay_type;

/// 生成对账报告（Markdown）
pub fn build_report(
    batch_id: Option<&str>,
    index: &StudentEssayIndex,
    failures: &[GradingFailure],
) -> String {
    let submissions: Vec<Submission> = index.submissions().cloned().collect();
    let summaries = summarize_by_essay_type(&submissions);

    let mut output = String::new();
    let _ = writeln!(output, "# Essay Score Review Report");
    let _ = writeln!(
        output,
        "Batch {} with {} students and {} essays",
        batch_id.unwrap_or("(local results)"),
        index.len(),
        index.essay_count()
    );
    let _ = writeln!(output);

    let urgent: Vec<&Submission> = submissions
        .iter()
        .filter(|s| s.requires_immediate_attention())
        .collect();
    if !urgent.is_empty() {
        let _ = writeln!(output, "## Requires Immediate Attention");
        for sub in urgent {
            let _ = writeln!(
                output,
                "- {} ({}): {}",
                sub.student_id,
                sub.essay_type,
                sub.flagged_spans.join(" | ")
            );
        }
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "## Essay Types");
    if summaries.is_empty() {
        let _ = writeln!(output, "No essays in this batch.");
    } else {
        for summary in summaries.iter() {
            let distribution = summary
                .score_distribution
                .iter()
                .map(|(score, count)| format!("{}: {}", score, count))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(
                output,
                "- {}: {} essays, avg score {:.2}, avg confidence {:.1}%, {} flagged (distribution {})",
                summary.essay_type,
                summary.total_essays,
                summary.average_score,
                summary.average_confidence,
                summary.flagged_count,
                distribution
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Students");
    if index.is_empty() {
        let _ = writeln!(output, "No students in this batch.");
    }
    for group in index.groups() {
        let _ = writeln!(output);
        let _ = writeln!(output, "### {}", group.student_id());
        for sub in group.essays() {
            let source = if sub.has_manual_override() {
                "reviewed"
            } else {
                "AI only"
            };
            let _ = writeln!(
                output,
                "- {} ({}): {} [{}], confidence {}%",
                sub.essay_type,
                sub.rubric_display_name(),
                sub.score_string(),
                source,
                sub.confidence
            );
            for record in &sub.score_records {
                let _ = writeln!(
                    output,
                    "  - {} {}/{} ({}) {}",
                    record.title(),
                    record.score,
                    record.max_score,
                    record.provenance.badge(),
                    record.rubric_level().label()
                );
            }
            if sub.flagged {
                let _ = writeln!(output, "  - Flagged: {}", sub.flag_reason);
            }
        }
    }

    if !failures.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Grading Failures");
        for failure in failures {
            let position = failure
                .essay_index
                .map(|i| format!("#{}", i))
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                output,
                "- [{}] {} {}: {}",
                failure.kind, position, failure.student_id, failure.error
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::submission::fixtures::{ai_record, submission};

    #[test]
    fn test_report_sections() {
        let mut index = StudentEssayIndex::new();
        let mut urgent = submission("S1", "Narrative", vec![ai_record("clarity", 3)]);
        urgent.flagged = true;
        urgent.flag_reason = "self_harm".to_string();
        urgent.flagged_spans = vec!["hurt myself".to_string()];
        index.upsert(urgent);
        index.upsert(submission("S2", "Narrative", vec![ai_record("clarity", 2)]));

        let failures = vec![GradingFailure {
            kind: "grading".to_string(),
            essay_index: Some(2),
            student_id: "S3".to_string(),
            error: "timeout".to_string(),
        }];

        let report = build_report(Some("batch-1"), &index, &failures);
        assert!(report.starts_with("# Essay Score Review Report"));
        assert!(report.contains("Batch batch-1 with 2 students and 2 essays"));
        assert!(report.contains("## Requires Immediate Attention\n- S1 (Narrative): hurt myself"));
        assert!(report.contains("- Narrative: 2 essays"));
        assert!(report.contains("### S2"));
        assert!(report.contains("3/4 [AI only]"));
        assert!(report.contains("- [grading] #2 S3: timeout"));
    }

    #[test]
    fn test_empty_report() {
        let report = build_report(None, &StudentEssayIndex::new(), &[]);
        assert!(report.contains("No essays in this batch."));
        assert!(!report.contains("## Grading Failures"));
    }
}
