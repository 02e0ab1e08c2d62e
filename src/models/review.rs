use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// 本次评阅中被评阅人改动过的维度键
pub type TouchedCriteria = BTreeSet<String>;

/// 评阅人提交的改分
///
/// `scores` 是完整的替换分数表（每个维度一个 0..满分 的整数），
/// `touched` 标记哪些维度由评阅人实际改动过。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewerOverride {
    pub student_id: String,
    /// 缺省时作用于该学生的第一篇作文
    #[serde(default)]
    pub essay_type: Option<String>,
    #[serde(default)]
    pub scores: BTreeMap<String, u32>,
    #[serde(default)]
    pub touched: TouchedCriteria,
    /// 评阅人总评；缺省时保留之前的总评
    #[serde(default)]
    pub overall_feedback: Option<String>,
    #[serde(skip)]
    pub file_path: Option<String>,
}

impl ReviewerOverride {
    pub fn new(student_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            ..Default::default()
        }
    }

    /// 设置一个维度的分数并标记为人工改动
    pub fn with_human_score(mut self, key: impl Into<String>, score: u32) -> Self {
        let key = key.into();
        self.scores.insert(key.clone(), score);
        self.touched.insert(key);
        self
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.overall_feedback = Some(feedback.into());
        self
    }

    pub fn with_file_path(mut self, file_path: String) -> Self {
        self.file_path = Some(file_path);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_from_toml() {
        let text = r#"
student_id = "S1"
essay_type = "Narrative"
touched = ["clarity"]
overall_feedback = "Good start."

[scores]
clarity = 1
textual_evidence = 2
"#;
        let parsed: ReviewerOverride = toml::from_str(text).unwrap();
        assert_eq!(parsed.student_id, "S1");
        assert_eq!(parsed.essay_type.as_deref(), Some("Narrative"));
        assert_eq!(parsed.scores.get("clarity"), Some(&1));
        assert_eq!(parsed.scores.len(), 2);
        assert!(parsed.touched.contains("clarity"));
        assert!(!parsed.touched.contains("textual_evidence"));
        assert!(parsed.file_path.is_none());
    }

    #[test]
    fn test_builder_marks_touched() {
        let o = ReviewerOverride::new("S1").with_human_score("clarity", 2);
        assert_eq!(o.scores.get("clarity"), Some(&2));
        assert!(o.touched.contains("clarity"));
        assert!(o.overall_feedback.is_none());
    }
}
