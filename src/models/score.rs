//! 单个维度的评分记录与计分方式

use serde::{Deserialize, Serialize};

use crate::models::criterion::{self, Criterion, RubricLevel};

/// 分数来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// AI 评分（缺省）
    #[default]
    Ai,
    /// 评阅人人工改分
    Human,
}

impl Provenance {
    /// 从原始字段解析，未知或缺失时视为 AI
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "human" || s == "manual" || s == "reviewer" => Provenance::Human,
            _ => Provenance::Ai,
        }
    }

    /// 界面徽标文字
    pub fn badge(self) -> &'static str {
        match self {
            Provenance::Ai => "AI",
            Provenance::Human => "Human",
        }
    }
}

/// 分数语义：总分制 或 平均分制
///
/// 二选一的固定策略，不按维度推断。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMode {
    /// 总分制，每个维度满分 4
    #[default]
    Sum,
    /// 平均分制，每个维度满分 3；一旦有人工改分即永久切换到此模式
    Mean,
}

impl ScoreMode {
    pub const SUM_MAX_SCORE: u32 = 4;
    pub const MEAN_MAX_SCORE: u32 = 3;

    /// 该模式下单个维度的满分
    pub fn max_score(self) -> u32 {
        match self {
            ScoreMode::Sum => Self::SUM_MAX_SCORE,
            ScoreMode::Mean => Self::MEAN_MAX_SCORE,
        }
    }
}

/// 单个维度的评分记录
///
/// 不变式：`score` 在 `[0, max_score]` 之间。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// 维度键（规范键、旧版键或透传的未知键）
    pub key: String,
    pub score: u32,
    #[serde(default)]
    pub provenance: Provenance,
    /// AI 给出的理由，人工改分不会改动
    #[serde(default)]
    pub justification: String,
    pub max_score: u32,
}

impl ScoreRecord {
    /// 创建评分记录，分数超出范围时截断到满分
    pub fn new(
        key: impl Into<String>,
        score: u32,
        provenance: Provenance,
        justification: impl Into<String>,
        max_score: u32,
    ) -> Self {
        Self {
            key: key.into(),
            score: score.min(max_score),
            provenance,
            justification: justification.into(),
            max_score,
        }
    }

    /// 对应的固定维度（未知维度返回 None）
    pub fn criterion(&self) -> Option<Criterion> {
        Criterion::from_key(&self.key)
    }

    /// 是否与给定键指向同一个维度（规范键和旧版键视为同一维度）
    pub fn matches_key(&self, key: &str) -> bool {
        criterion::same_criterion(&self.key, key)
    }

    pub fn is_human(&self) -> bool {
        self.provenance == Provenance::Human
    }

    pub fn title(&self) -> String {
        criterion::display_title(&self.key)
    }

    pub fn rubric_level(&self) -> RubricLevel {
        RubricLevel::for_score(self.max_score, self.score)
    }

    /// 评分细则描述
    pub fn rubric_text(&self) -> String {
        match self.criterion() {
            Some(c) => c.describe_score(self.max_score, self.score),
            None => self.rubric_level().describe(&self.title()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provenance_defaults_to_ai() {
        assert_eq!(Provenance::parse(None), Provenance::Ai);
        assert_eq!(Provenance::parse(Some("")), Provenance::Ai);
        assert_eq!(Provenance::parse(Some("something")), Provenance::Ai);
        assert_eq!(Provenance::parse(Some(" Human ")), Provenance::Human);
    }

    #[test]
    fn test_provenance_missing_in_json() {
        let record: ScoreRecord =
            serde_json::from_str(r#"{"key":"clarity","score":2,"max_score":4}"#).unwrap();
        assert_eq!(record.provenance, Provenance::Ai);
        assert!(record.justification.is_empty());
    }

    #[test]
    fn test_new_clamps_score() {
        let record = ScoreRecord::new("clarity", 9, Provenance::Ai, "", 4);
        assert_eq!(record.score, 4);
    }

    #[test]
    fn test_matches_key_across_forms() {
        let record = ScoreRecord::new("writingquality", 2, Provenance::Ai, "", 4);
        assert!(record.matches_key("writing_quality"));
        assert!(record.matches_key("writingquality"));
        assert!(!record.matches_key("textual_evidence"));

        let custom = ScoreRecord::new("clarity", 2, Provenance::Ai, "", 4);
        assert!(custom.matches_key("clarity"));
        assert!(!custom.matches_key("Clarity"));
    }

    #[test]
    fn test_rubric_text_for_known_and_unknown_keys() {
        let known = ScoreRecord::new("textualevidence", 4, Provenance::Ai, "", 4);
        assert_eq!(
            known.rubric_text(),
            Criterion::TextualEvidence.describe_score(4, 4)
        );
        assert!(known.rubric_text().starts_with("Exemplary"));

        let custom = ScoreRecord::new("use_of_sources", 0, Provenance::Ai, "", 3);
        assert_eq!(custom.rubric_text(), "Inadequate: shows no meaningful use of sources");
    }
}
