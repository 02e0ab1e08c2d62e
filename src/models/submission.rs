//! 一篇作文的评分结果与派生的汇总

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::score::{ScoreMode, ScoreRecord};

/// 评分处理状态
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    #[default]
    Completed,
    Failed,
    Pending,
}

impl ProcessingStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("failed") | Some("error") => ProcessingStatus::Failed,
            Some("pending") | Some("processing") => ProcessingStatus::Pending,
            _ => ProcessingStatus::Completed,
        }
    }
}

/// 一篇作文的评分结果
///
/// 只由解析器创建、由改分合并器整体替换；其它组件只读。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub student_id: String,
    /// 学生编号是否为解析器生成的占位符
    #[serde(default)]
    pub placeholder_id: bool,
    pub content_id: String,
    pub essay_type: String,
    pub essay_response: String,
    pub essay_prompt: String,
    pub mode: ScoreMode,
    pub score_records: Vec<ScoreRecord>,
    /// AI 置信度 0-100
    pub confidence: u8,
    #[serde(default)]
    pub confidence_explanation: String,
    pub flagged: bool,
    #[serde(default)]
    pub flag_reason: String,
    /// 被标记的原文片段（保序去重）
    #[serde(default)]
    pub flagged_spans: Vec<String>,
    /// AI 原始总评，任何改分都不会覆盖
    pub ai_feedback: String,
    /// 评阅人填写的总评
    #[serde(default)]
    pub reviewer_feedback: Option<String>,
    #[serde(default)]
    pub strengths: String,
    #[serde(default)]
    pub areas_for_improvement: String,
    pub processing_status: ProcessingStatus,
    /// 评分服务自报的总分（仅用于核对）
    #[serde(default)]
    pub reported_essay_score: Option<f64>,
    #[serde(default)]
    pub grader_model: Option<String>,
    #[serde(default)]
    pub graded_at: Option<String>,
    /// 最近一次人工改分时间
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl Submission {
    /// 索引键：(学生编号, 作文类型)
    pub fn key(&self) -> (&str, &str) {
        (&self.student_id, &self.essay_type)
    }

    /// 各维度分数之和
    pub fn aggregate_score(&self) -> u32 {
        self.score_records.iter().map(|r| r.score).sum()
    }

    /// 总分满分 = 维度数 × 单维满分
    pub fn aggregate_max(&self) -> u32 {
        self.score_records.len() as u32 * self.mode.max_score()
    }

    /// 平均分（未取整）
    pub fn mean_score(&self) -> f64 {
        if self.score_records.is_empty() {
            return 0.0;
        }
        self.aggregate_score() as f64 / self.score_records.len() as f64
    }

    /// 用于展示的平均分（四舍五入）
    pub fn mean_display(&self) -> u32 {
        self.mean_score().round() as u32
    }

    /// `分数/满分` 形式的展示字符串
    pub fn score_string(&self) -> String {
        match self.mode {
            ScoreMode::Sum => format!("{}/{}", self.aggregate_score(), self.aggregate_max()),
            ScoreMode::Mean => format!("{}/{}", self.mean_display(), self.mode.max_score()),
        }
    }

    /// 是否存在人工改分的维度
    pub fn has_manual_override(&self) -> bool {
        self.score_records.iter().any(|r| r.is_human())
    }

    /// 当前展示的总评：评阅人填写的优先
    pub fn overall_feedback(&self) -> &str {
        self.reviewer_feedback.as_deref().unwrap_or(&self.ai_feedback)
    }

    pub fn ai_overall_feedback(&self) -> &str {
        &self.ai_feedback
    }

    /// 自伤风险内容需要立即关注
    pub fn requires_immediate_attention(&self) -> bool {
        self.flag_reason == "self_harm"
    }

    pub fn find_record(&self, key: &str) -> Option<&ScoreRecord> {
        self.score_records.iter().find(|r| r.matches_key(key))
    }

    /// 评分细则名称，由 content_id 推导：
    /// `Winter_Hibiscus_Grade10_20250812_180450` -> `Winter Hibiscus Grade10`
    pub fn rubric_display_name(&self) -> String {
        let mut parts: Vec<&str> = self
            .content_id
            .split('_')
            .filter(|p| !p.is_empty())
            .collect();
        // 去掉末尾的 日期_时间 戳
        while let Some(last) = parts.last() {
            let is_stamp = (last.len() == 8 || last.len() == 6)
                && last.chars().all(|c| c.is_ascii_digit());
            if is_stamp {
                parts.pop();
            } else {
                break;
            }
        }
        if parts.is_empty() {
            self.essay_type.clone()
        } else {
            parts.join(" ")
        }
    }
}
