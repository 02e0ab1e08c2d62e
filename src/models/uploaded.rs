use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// 原始上传的作文数据（与评分请求体中的单篇作文格式一致）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedEssay {
    #[serde(deserialize_with = "deserialize_id")]
    pub student_id: String,
    #[serde(default)]
    pub content_id: String,
    #[serde(default)]
    pub essay_type: String,
    #[serde(default)]
    pub essay_response: String,
}

// 学生编号可能是字符串也可能是数字
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer student id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.trim().to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// 外部协作方：按学生编号（和作文类型）查找原始上传的作文
pub trait EssaySource {
    /// 给出作文类型时按 (学生, 类型) 精确匹配；
    /// 否则只在该学生只有一篇上传作文时返回它
    fn lookup(&self, student_id: &str, essay_type: Option<&str>) -> Option<&UploadedEssay>;
}

/// 没有上传数据时使用
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEssaySource;

impl EssaySource for NoEssaySource {
    fn lookup(&self, _student_id: &str, _essay_type: Option<&str>) -> Option<&UploadedEssay> {
        None
    }
}

/// 已上传作文集合，保持上传顺序
///
/// 一个学生可以有多篇不同类型的作文；(学生, 类型) 重复时保留第一条。
#[derive(Debug, Default, Clone)]
pub struct UploadedEssays {
    essays: Vec<UploadedEssay>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UploadedPayload {
    List(Vec<UploadedEssay>),
    Wrapped { essays: Vec<UploadedEssay> },
    Single(UploadedEssay),
}

impl UploadedEssays {
    pub fn new(list: Vec<UploadedEssay>) -> Self {
        let mut essays: Vec<UploadedEssay> = Vec::with_capacity(list.len());
        for essay in list {
            let duplicate = essays
                .iter()
                .any(|e| e.student_id == essay.student_id && e.essay_type == essay.essay_type);
            if duplicate {
                debug!("重复的上传作文 {} ({})，保留第一条", essay.student_id, essay.essay_type);
                continue;
            }
            essays.push(essay);
        }
        Self { essays }
    }

    /// 支持三种格式：数组、`{"essays": [...]}`、单个对象
    pub fn from_json_str(text: &str, origin: &str) -> AppResult<Self> {
        let payload: UploadedPayload =
            serde_json::from_str(text).map_err(|e| AppError::invalid_json(origin, e))?;
        let list = match payload {
            UploadedPayload::List(list) => list,
            UploadedPayload::Wrapped { essays } => essays,
            UploadedPayload::Single(essay) => vec![essay],
        };
        Ok(Self::new(list))
    }

    pub fn len(&self) -> usize {
        self.essays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.essays.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadedEssay> {
        self.essays.iter()
    }
}

impl EssaySource for UploadedEssays {
    fn lookup(&self, student_id: &str, essay_type: Option<&str>) -> Option<&UploadedEssay> {
        let mut candidates = self.essays.iter().filter(|e| e.student_id == student_id);

        if let Some(essay_type) = essay_type {
            if let Some(found) = candidates.clone().find(|e| e.essay_type == essay_type) {
                return Some(found);
            }
        }

        match (candidates.next(), candidates.next()) {
            (Some(only), None) => Some(only),
            (Some(_), Some(_)) => {
                debug!("学生 {} 有多篇上传作文且无法按类型区分，不使用上传数据", student_id);
                None
            }
            _ => None,
        }
    }
}
