//! 评阅界面展示数据
//!
//! 把一篇 `Submission` 展开成界面需要的全部字段，展示层不再做任何计算。

use serde::Serialize;

use crate::models::criterion::RubricLevel;
use crate::models::score::{Provenance, ScoreMode, ScoreRecord};
use crate::models::submission::Submission;
use crate::services::{escape_html, highlight_flagged_spans};

/// 单个维度的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionRow {
    pub key: String,
    pub title: String,
    pub score: u32,
    pub max_score: u32,
    pub provenance: Provenance,
    /// "AI" / "Human"
    pub badge: &'static str,
    pub rubric_level: RubricLevel,
    pub rubric_text: String,
    pub justification: String,
}

impl From<&ScoreRecord> for CriterionRow {
    fn from(record: &ScoreRecord) -> Self {
        Self {
            key: record.key.clone(),
            title: record.title(),
            score: record.score,
            max_score: record.max_score,
            provenance: record.provenance,
            badge: record.provenance.badge(),
            rubric_level: record.rubric_level(),
            rubric_text: record.rubric_text(),
            justification: record.justification.clone(),
        }
    }
}

/// 一篇作文的完整展示数据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionView {
    pub student_id: String,
    pub essay_type: String,
    pub rubric_name: String,
    pub mode: ScoreMode,
    /// `分数/满分`
    pub score_string: String,
    pub has_manual_override: bool,
    pub rows: Vec<CriterionRow>,
    pub essay_prompt: String,
    /// 已高亮标记片段的作文
    pub annotated_essay: String,
    /// 该学生可切换的作文类型
    pub essay_types: Vec<String>,
    pub confidence: u8,
    pub flagged: bool,
    pub flag_reason: String,
    pub requires_immediate_attention: bool,
    pub overall_feedback: String,
    pub ai_feedback: String,
}

impl SubmissionView {
    pub fn build(submission: &Submission, essay_types: Vec<String>) -> Self {
        Self {
            student_id: submission.student_id.clone(),
            essay_type: submission.essay_type.clone(),
            rubric_name: submission.rubric_display_name(),
            mode: submission.mode,
            score_string: submission.score_string(),
            has_manual_override: submission.has_manual_override(),
            rows: submission.score_records.iter().map(CriterionRow::from).collect(),
            essay_prompt: submission.essay_prompt.clone(),
            annotated_essay: annotate_essay(&submission.essay_response, &submission.flagged_spans),
            essay_types,
            confidence: submission.confidence,
            flagged: submission.flagged,
            flag_reason: submission.flag_reason.clone(),
            requires_immediate_attention: submission.requires_immediate_attention(),
            overall_feedback: submission.overall_feedback().to_string(),
            ai_feedback: submission.ai_overall_feedback().to_string(),
        }
    }

    pub fn human_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.provenance == Provenance::Human)
            .count()
    }
}

/// 作文正文总是以转义后的 HTML 输出，有标记片段时再加高亮
fn annotate_essay(text: &str, spans: &[String]) -> String {
    if spans.iter().any(|s| !s.trim().is_empty()) {
        highlight_flagged_spans(text, spans)
    } else {
        escape_html(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::submission::fixtures::{ai_record, submission};

    #[test]
    fn test_build_view() {
        let mut sub = submission(
            "S1",
            "Narrative",
            vec![ai_record("textual_evidence", 4), ai_record("clarity", 0)],
        );
        sub.essay_response = "I want to hurt myself.".to_string();
        sub.flagged = true;
        sub.flag_reason = "self_harm".to_string();
        sub.flagged_spans = vec!["hurt myself".to_string()];

        let view = SubmissionView::build(&sub, vec!["Narrative".to_string()]);
        assert_eq!(view.score_string, "4/8");
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].title, "Textual Evidence");
        assert_eq!(view.rows[0].badge, "AI");
        assert_eq!(view.rows[0].rubric_level, RubricLevel::Exemplary);
        assert_eq!(view.rows[1].rubric_level, RubricLevel::Inadequate);
        assert_eq!(view.annotated_essay, "I want to <mark>hurt myself</mark>.");
        assert!(view.requires_immediate_attention);
        assert_eq!(view.human_rows(), 0);
        assert_eq!(view.essay_types, vec!["Narrative"]);
    }

    #[test]
    fn test_unflagged_essay_is_escaped() {
        let mut sub = submission("S1", "Narrative", vec![ai_record("clarity", 2)]);
        sub.essay_response = "a <b>bold</b> claim".to_string();

        let view = SubmissionView::build(&sub, vec![]);
        assert_eq!(view.annotated_essay, "a &lt;b&gt;bold&lt;/b&gt; claim");

        sub.flagged_spans = vec!["  ".to_string()];
        let view = SubmissionView::build(&sub, vec![]);
        assert_eq!(view.annotated_essay, "a &lt;b&gt;bold&lt;/b&gt; claim");

        sub.flagged_spans = vec!["claim".to_string()];
        let view = SubmissionView::build(&sub, vec![]);
        assert_eq!(view.annotated_essay, "a &lt;b&gt;bold&lt;/b&gt; <mark>claim</mark>");
    }
}
