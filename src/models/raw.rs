//! 评分服务原始响应
//!
//! 原始响应有三种形态，在解析边界一次性识别成枚举：
//! - 单篇：裸对象
//! - 单篇：带 `result` 包装的对象
//! - 批量：`results` 数组（成员本身可能是裸对象或包装对象）
//!
//! 下游组件只看到规范化后的 `Submission`。

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::{AppError, AppResult, InputError};

/// 一条原始评分记录
///
/// `outer` 是批量层/包装层字段，`inner` 是嵌套的 `result` 字段。
/// 取值时外层优先。
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    /// 在批量结果中的位置（从 0 开始）
    pub position: usize,
    outer: Map<String, JsonValue>,
    inner: Option<Map<String, JsonValue>>,
}

impl RawRecord {
    pub fn from_value(value: JsonValue, position: usize) -> Self {
        match value {
            JsonValue::Object(mut outer) => {
                let inner = match outer.remove("result") {
                    Some(JsonValue::Object(inner)) => Some(inner),
                    Some(other) => {
                        // 非对象的 result 原样放回，当作普通字段
                        outer.insert("result".to_string(), other);
                        None
                    }
                    None => None,
                };
                Self {
                    position,
                    outer,
                    inner,
                }
            }
            _ => Self {
                position,
                ..Default::default()
            },
        }
    }

    /// 是否带有 `result` 包装
    pub fn is_wrapped(&self) -> bool {
        self.inner.is_some()
    }

    /// 外层优先取字段；外层为空字符串时回退到嵌套字段
    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.outer_field(field)
            .filter(|v| !is_blank(v))
            .or_else(|| self.nested_field(field))
    }

    /// 只取外层（批量层/包装层）字段
    pub fn outer_field(&self, field: &str) -> Option<&JsonValue> {
        self.outer.get(field).filter(|v| !v.is_null())
    }

    /// 只取嵌套 `result` 字段
    pub fn nested_field(&self, field: &str) -> Option<&JsonValue> {
        self.inner
            .as_ref()
            .and_then(|m| m.get(field))
            .filter(|v| !v.is_null())
    }

    /// 取非空字符串；数字会转为字符串。外层取不到文本时再看嵌套字段
    pub fn get_text(&self, field: &str) -> Option<String> {
        self.outer_text(field).or_else(|| self.nested_text(field))
    }

    pub fn outer_text(&self, field: &str) -> Option<String> {
        self.outer_field(field).and_then(value_to_text)
    }

    pub fn nested_text(&self, field: &str) -> Option<String> {
        self.nested_field(field).and_then(value_to_text)
    }

    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }
}

fn is_blank(value: &JsonValue) -> bool {
    matches!(value, JsonValue::String(s) if s.trim().is_empty())
}

/// JSON 值转为非空字符串
pub fn value_to_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 批量处理中评分服务报告的失败项
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradingFailure {
    /// 失败类别：validation / rubric_load / grading
    pub kind: String,
    pub essay_index: Option<usize>,
    pub student_id: String,
    pub error: String,
}

/// 识别后的原始响应
#[derive(Debug, Clone)]
pub enum RawGradingResponse {
    Single(RawRecord),
    Batch {
        batch_id: Option<String>,
        records: Vec<RawRecord>,
        failures: Vec<GradingFailure>,
    },
}

impl RawGradingResponse {
    /// 从 JSON 文本解析；非法 JSON 直接作为阻断错误返回
    pub fn from_json_str(text: &str, origin: &str) -> AppResult<Self> {
        let value: JsonValue =
            serde_json::from_str(text).map_err(|e| AppError::invalid_json(origin, e))?;
        Self::from_value(value, origin)
    }

    pub fn from_value(value: JsonValue, origin: &str) -> AppResult<Self> {
        let value = unwrap_gateway_envelope(value, origin)?;

        match value {
            JsonValue::Array(items) => Ok(RawGradingResponse::Batch {
                batch_id: None,
                records: to_records(items),
                failures: Vec::new(),
            }),
            JsonValue::Object(mut obj) => match obj.remove("results") {
                Some(JsonValue::Array(items)) => {
                    let batch_id = obj.get("batch_id").and_then(value_to_text);
                    let failures = obj.get("errors").map(collect_failures).unwrap_or_default();
                    Ok(RawGradingResponse::Batch {
                        batch_id,
                        records: to_records(items),
                        failures,
                    })
                }
                Some(other) => {
                    obj.insert("results".to_string(), other);
                    Ok(RawGradingResponse::Single(RawRecord::from_value(
                        JsonValue::Object(obj),
                        0,
                    )))
                }
                None => Ok(RawGradingResponse::Single(RawRecord::from_value(
                    JsonValue::Object(obj),
                    0,
                ))),
            },
            other => Err(AppError::Input(InputError::UnexpectedShape {
                origin: origin.to_string(),
                found: json_kind(&other).to_string(),
            })),
        }
    }

    pub fn batch_id(&self) -> Option<&str> {
        match self {
            RawGradingResponse::Single(_) => None,
            RawGradingResponse::Batch { batch_id, .. } => batch_id.as_deref(),
        }
    }

    pub fn failures(&self) -> &[GradingFailure] {
        match self {
            RawGradingResponse::Single(_) => &[],
            RawGradingResponse::Batch { failures, .. } => failures,
        }
    }

    /// 取出全部记录
    pub fn into_records(self) -> Vec<RawRecord> {
        match self {
            RawGradingResponse::Single(record) => vec![record],
            RawGradingResponse::Batch { records, .. } => records,
        }
    }
}

/// 网关响应 `{"statusCode": 200, "body": "<json>"}` 需要先拆开
fn unwrap_gateway_envelope(value: JsonValue, origin: &str) -> AppResult<JsonValue> {
    if let JsonValue::Object(obj) = &value {
        if obj.contains_key("statusCode") {
            match obj.get("body") {
                Some(JsonValue::String(body)) => {
                    return serde_json::from_str(body).map_err(|e| AppError::invalid_json(origin, e));
                }
                Some(body @ JsonValue::Object(_)) => return Ok(body.clone()),
                _ => {}
            }
        }
    }
    Ok(value)
}

fn to_records(items: Vec<JsonValue>) -> Vec<RawRecord> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, v)| RawRecord::from_value(v, i))
        .collect()
}

fn collect_failures(errors: &JsonValue) -> Vec<GradingFailure> {
    let mut failures = Vec::new();
    for (field, kind) in [
        ("validation_errors", "validation"),
        ("rubric_load_errors", "rubric_load"),
        ("grading_errors", "grading"),
    ] {
        let Some(JsonValue::Array(items)) = errors.get(field) else {
            continue;
        };
        for item in items {
            failures.push(GradingFailure {
                kind: kind.to_string(),
                essay_index: item
                    .get("essay_index")
                    .and_then(|v| v.as_u64())
                    .map(|v| v as usize),
                student_id: item
                    .get("student_id")
                    .and_then(value_to_text)
                    .unwrap_or_else(|| "unknown".to_string()),
                error: item
                    .get("error")
                    .and_then(value_to_text)
                    .unwrap_or_default(),
            });
        }
    }
    failures
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_single_record() {
        let resp = RawGradingResponse::from_value(json!({"student_id": "S1"}), "test").unwrap();
        let records = resp.into_records();
        assert_eq!(records.len(), 1);
        assert!(!records[0].is_wrapped());
        assert_eq!(records[0].get_text("student_id").as_deref(), Some("S1"));
    }

    #[test]
    fn test_wrapped_record_prefers_outer_fields() {
        let resp = RawGradingResponse::from_value(
            json!({
                "student_id": "S1",
                "essay_type": "Outer Type",
                "result": {"essay_type": "Inner Type", "essay_response": "text"}
            }),
            "test",
        )
        .unwrap();
        let record = resp.into_records().remove(0);
        assert!(record.is_wrapped());
        assert_eq!(record.get_text("essay_type").as_deref(), Some("Outer Type"));
        assert_eq!(record.nested_text("essay_type").as_deref(), Some("Inner Type"));
        assert_eq!(record.get_text("essay_response").as_deref(), Some("text"));
    }

    #[test]
    fn test_blank_outer_text_uses_nested_value() {
        let record = RawRecord::from_value(
            json!({"student_id": "", "essay_type": "", "result": {"student_id": "S7", "essay_type": "Narrative"}}),
            0,
        );
        assert_eq!(record.get_text("student_id").as_deref(), Some("S7"));
        assert_eq!(record.get_text("essay_type").as_deref(), Some("Narrative"));
        assert_eq!(record.get("essay_type"), Some(&json!("Narrative")));
        assert!(record.has("student_id"));
    }

    #[test]
    fn test_batch_with_failures() {
        let resp = RawGradingResponse::from_value(
            json!({
                "batch_id": "b-1",
                "results": [{"student_id": "S1"}, {"student_id": 42}],
                "errors": {
                    "validation_errors": [{"essay_index": 2, "error": "Missing required parameter: essay_type", "student_id": "S3"}],
                    "grading_errors": [{"essay_index": 3, "error": "timeout"}]
                }
            }),
            "test",
        )
        .unwrap();
        assert_eq!(resp.batch_id(), Some("b-1"));
        assert_eq!(resp.failures().len(), 2);
        assert_eq!(resp.failures()[1].student_id, "unknown");
        let records = resp.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].position, 1);
        assert_eq!(records[1].get_text("student_id").as_deref(), Some("42"));
    }

    #[test]
    fn test_gateway_envelope_is_unwrapped() {
        let body = json!({"results": [{"student_id": "S1"}]}).to_string();
        let resp =
            RawGradingResponse::from_value(json!({"statusCode": 200, "body": body}), "test").unwrap();
        assert_eq!(resp.into_records().len(), 1);
    }

    #[test]
    fn test_invalid_json_is_blocking() {
        let err = RawGradingResponse::from_json_str("{\"results\": [", "upload").unwrap_err();
        assert!(err.is_blocking_input());
    }

    #[test]
    fn test_scalar_top_level_rejected() {
        let err = RawGradingResponse::from_value(json!("hello"), "upload").unwrap_err();
        assert!(matches!(err, AppError::Input(InputError::UnexpectedShape { .. })));
    }

    #[test]
    fn test_non_object_member_becomes_empty_record() {
        let resp = RawGradingResponse::from_value(json!({"results": [null, 3]}), "test").unwrap();
        let records = resp.into_records();
        assert_eq!(records.len(), 2);
        assert!(records[0].get_text("student_id").is_none());
    }
}
