//! 评分结果解析 - 业务能力层
//!
//! 把一条原始评分记录转换为规范的 `Submission`。
//!
//! ## 规则
//! 1. 出现“已人工改分”标记或显式平均分字段时用平均分制（满分 3），否则用总分制（满分 4）
//! 2. 扫描最多 10 个 `rubric_metric{i}` 槽位，只有分数 > 0 的槽位生成评分记录；
//!    0 分与缺失无法区分，一律丢弃
//! 3. 槽位结果经过维度键归一化
//! 4. 找不到学生编号时生成占位编号，不影响同批次其它记录

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::criterion::Criterion;
use crate::models::raw::{value_to_text, GradingFailure, RawGradingResponse, RawRecord};
use crate::models::score::{Provenance, ScoreMode, ScoreRecord};
use crate::models::submission::{ProcessingStatus, Submission};
use crate::models::uploaded::EssaySource;
use crate::services::normalizer::normalize_criterion_keys;

/// 评分槽位数量上限
pub const MAX_METRIC_SLOTS: usize = 10;

/// 作文正文缺失时的占位文字
pub const DEFAULT_ESSAY_TEXT: &str = "(essay text unavailable)";

/// “是”标记的字面值
const AFFIRMATIVE: &str = "Yes";

/// 一批解析结果
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    pub batch_id: Option<String>,
    pub submissions: Vec<Submission>,
    /// 评分服务报告的失败项（仅展示）
    pub failures: Vec<GradingFailure>,
}

/// 评分结果解析器
pub struct SubmissionParser {
    default_essay_type: String,
}

impl SubmissionParser {
    pub fn new(config: &Config) -> Self {
        Self::with_default_essay_type(config.default_essay_type.clone())
    }

    pub fn with_default_essay_type(label: impl Into<String>) -> Self {
        Self {
            default_essay_type: label.into(),
        }
    }

    /// 解析整个响应；单条记录的问题不会中断整批
    pub fn parse_response(&self, response: RawGradingResponse, essays: &dyn EssaySource) -> ParsedBatch {
        let batch_id = response.batch_id().map(str::to_string);
        let failures = response.failures().to_vec();
        let records = response.into_records();

        info!("📥 开始解析 {} 条评分记录", records.len());
        if !failures.is_empty() {
            warn!("⚠️ 评分服务报告了 {} 个失败项", failures.len());
        }

        let submissions = records
            .iter()
            .map(|record| self.parse_record(record, essays))
            .collect();

        ParsedBatch {
            batch_id,
            submissions,
            failures,
        }
    }

    /// 解析单条记录
    pub fn parse_record(&self, record: &RawRecord, essays: &dyn EssaySource) -> Submission {
        let (student_id, placeholder_id) = match record.get_text("student_id") {
            Some(id) => (id, false),
            None => {
                let id = format!("unknown-student-{}", record.position + 1);
                warn!("[记录 {}] ⚠️ 缺少学生编号，使用占位编号 {}", record.position + 1, id);
                (id, true)
            }
        };

        let record_type = record.get_text("essay_type");
        let uploaded = if placeholder_id {
            None
        } else {
            essays.lookup(&student_id, record_type.as_deref())
        };

        // 外层字段 -> 嵌套 result 字段 -> 上传数据 -> 默认值
        let essay_type = record_type
            .or_else(|| non_empty(uploaded.map(|u| u.essay_type.as_str())))
            .unwrap_or_else(|| self.default_essay_type.clone());
        let essay_response = record
            .get_text("essay_response")
            .or_else(|| non_empty(uploaded.map(|u| u.essay_response.as_str())))
            .unwrap_or_else(|| DEFAULT_ESSAY_TEXT.to_string());
        let content_id = record
            .get_text("content_id")
            .or_else(|| non_empty(uploaded.map(|u| u.content_id.as_str())))
            .unwrap_or_default();

        let mode = score_mode(record);
        let score_records = collect_score_records(record, mode);

        let flag_reason = record.get_text("flag_reason").unwrap_or_default();
        let flagged_spans = parse_flagged_content(record.get("flagged_content"));
        if flag_reason == "self_harm" {
            warn!("🚨 学生 {} 的作文检测到自伤风险内容", student_id);
            for (i, sentence) in flagged_spans.iter().enumerate() {
                warn!("🚨 标记句子 {}: {}", i + 1, sentence);
            }
        } else if !flag_reason.is_empty() {
            info!("学生 {} 的作文被标记: {}", student_id, flag_reason);
        }

        let submission = Submission {
            student_id,
            placeholder_id,
            content_id,
            essay_type,
            essay_response,
            essay_prompt: record.get_text("essay_question").unwrap_or_default(),
            mode,
            score_records,
            confidence: parse_confidence(record.get("ai_confidence")),
            confidence_explanation: record.get_text("confidence_explanation").unwrap_or_default(),
            flagged: matches!(record.get("essay_flagged"), Some(JsonValue::String(s)) if s == AFFIRMATIVE),
            flag_reason,
            flagged_spans,
            ai_feedback: record
                .get_text("score_description")
                .or_else(|| record.get_text("score_justification"))
                .unwrap_or_default(),
            reviewer_feedback: None,
            strengths: record.get_text("strengths").unwrap_or_default(),
            areas_for_improvement: record.get_text("areas_for_improvement").unwrap_or_default(),
            processing_status: ProcessingStatus::parse(record.get_text("processing_status").as_deref()),
            reported_essay_score: record.get("essay_score").and_then(JsonValue::as_f64),
            grader_model: record.get_text("grader_model"),
            graded_at: record.get_text("grading_timestamp"),
            reviewed_at: None,
        };

        debug!(
            "[记录 {}] 学生 {} | {} | {} 个维度 | 得分 {}",
            record.position + 1,
            submission.student_id,
            submission.essay_type,
            submission.score_records.len(),
            submission.score_string()
        );

        submission
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// 判断分数语义
fn score_mode(record: &RawRecord) -> ScoreMode {
    let manual = match record.get("manual_override") {
        Some(JsonValue::Bool(b)) => *b,
        Some(JsonValue::String(s)) => s.trim().eq_ignore_ascii_case(AFFIRMATIVE),
        _ => false,
    };
    if manual || record.has("mean_score") {
        ScoreMode::Mean
    } else {
        ScoreMode::Sum
    }
}

/// 扫描评分槽位，生成归一化后的评分记录（按槽位顺序）
fn collect_score_records(record: &RawRecord, mode: ScoreMode) -> Vec<ScoreRecord> {
    let max_score = mode.max_score();
    let justifications = record
        .get("metric_justifications")
        .and_then(JsonValue::as_object);

    let mut slots: BTreeMap<String, (usize, ScoreRecord)> = BTreeMap::new();

    for slot in 1..=MAX_METRIC_SLOTS {
        let Some(name) = record.get_text(&format!("rubric_metric{}_name", slot)) else {
            continue;
        };
        let score = match record
            .get(&format!("rubric_metric{}_score", slot))
            .and_then(parse_score)
        {
            Some(s) if s > 0 => s,
            _ => continue,
        };
        if slots.contains_key(&name) {
            debug!("槽位 {} 的维度 {} 重复，保留先出现的", slot, name);
            continue;
        }
        if score > max_score {
            warn!(
                "维度 {} 的分数 {} 超出满分 {}，已截断",
                name, score, max_score
            );
        }

        let provenance =
            Provenance::parse(record.get_text(&format!("rubric_metric{}_source", slot)).as_deref());
        let justification = lookup_justification(justifications, &name);
        let score_record = ScoreRecord::new(name.clone(), score, provenance, justification, max_score);
        slots.insert(name, (slot, score_record));
    }

    let mut ordered: Vec<(usize, ScoreRecord)> =
        normalize_criterion_keys(slots).into_values().collect();
    ordered.sort_by_key(|(slot, _)| *slot);
    ordered.into_iter().map(|(_, r)| r).collect()
}

/// 按维度名查理由；查不到时尝试同一维度的另一种写法
fn lookup_justification(
    justifications: Option<&serde_json::Map<String, JsonValue>>,
    name: &str,
) -> String {
    let Some(map) = justifications else {
        return String::new();
    };
    if let Some(text) = map.get(name).and_then(value_to_text) {
        return text;
    }
    Criterion::from_key(name)
        .and_then(|c| {
            map.get(c.canonical_key())
                .or_else(|| map.get(c.legacy_key()))
                .and_then(value_to_text)
        })
        .unwrap_or_default()
}

/// 解析各种形式的分数：整数、浮点（四舍五入）、数字字符串、`"n/m"`
pub fn parse_score(value: &JsonValue) -> Option<u32> {
    let number = match value {
        JsonValue::Number(n) => n.as_f64()?,
        JsonValue::String(s) => s.split('/').next()?.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() || number < 0.0 {
        return None;
    }
    Some(number.round() as u32)
}

fn parse_confidence(value: Option<&JsonValue>) -> u8 {
    let raw = match value {
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    raw.filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 100.0).round() as u8)
        .unwrap_or(0)
}

/// 标记内容可能是数组，也可能是用 `" | "` 连接的字符串；结果保序去重
pub fn parse_flagged_content(value: Option<&JsonValue>) -> Vec<String> {
    let items: Vec<String> = match value {
        Some(JsonValue::Array(items)) => items.iter().filter_map(value_to_text).collect(),
        Some(JsonValue::String(s)) if s.contains(" | ") => s
            .split(" | ")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
        Some(other) => value_to_text(other).into_iter().collect(),
        None => Vec::new(),
    };

    let mut unique: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}
