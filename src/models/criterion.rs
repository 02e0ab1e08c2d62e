//! 评分维度（Criterion）定义
//!
//! 固定的维度集合，以及两套历史命名方式：
//! - 规范键（canonical）：下划线分隔，如 `content_understanding`
//! - 旧版键（legacy）：无分隔符的紧凑写法，如 `contentunderstanding`

use phf::phf_map;
use serde::{Deserialize, Serialize};

/// 评分维度枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// 内容理解
    ContentUnderstanding,
    /// 切题程度
    QuestionAddressing,
    /// 批判性分析
    CriticalAnalysis,
    /// 文本证据
    TextualEvidence,
    /// 整体表现
    OverallPerformance,
    /// 写作质量
    WritingQuality,
}

static CANONICAL_KEYS: phf::Map<&'static str, Criterion> = phf_map! {
    "content_understanding" => Criterion::ContentUnderstanding,
    "question_addressing" => Criterion::QuestionAddressing,
    "critical_analysis" => Criterion::CriticalAnalysis,
    "textual_evidence" => Criterion::TextualEvidence,
    "overall_performance" => Criterion::OverallPerformance,
    "writing_quality" => Criterion::WritingQuality,
};

static LEGACY_KEYS: phf::Map<&'static str, Criterion> = phf_map! {
    "contentunderstanding" => Criterion::ContentUnderstanding,
    "questionaddressing" => Criterion::QuestionAddressing,
    "criticalanalysis" => Criterion::CriticalAnalysis,
    "textualevidence" => Criterion::TextualEvidence,
    "overallperformance" => Criterion::OverallPerformance,
    "writingquality" => Criterion::WritingQuality,
};

/// 键的命名形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyForm {
    Canonical(Criterion),
    Legacy(Criterion),
    /// 未知维度，原样透传
    Unknown,
}

impl Criterion {
    /// 全部维度，按展示顺序
    pub const ALL: [Criterion; 6] = [
        Criterion::ContentUnderstanding,
        Criterion::QuestionAddressing,
        Criterion::CriticalAnalysis,
        Criterion::TextualEvidence,
        Criterion::OverallPerformance,
        Criterion::WritingQuality,
    ];

    /// 规范键
    pub fn canonical_key(self) -> &'static str {
        match self {
            Criterion::ContentUnderstanding => "content_understanding",
            Criterion::QuestionAddressing => "question_addressing",
            Criterion::CriticalAnalysis => "critical_analysis",
            Criterion::TextualEvidence => "textual_evidence",
            Criterion::OverallPerformance => "overall_performance",
            Criterion::WritingQuality => "writing_quality",
        }
    }

    /// 旧版紧凑键
    pub fn legacy_key(self) -> &'static str {
        match self {
            Criterion::ContentUnderstanding => "contentunderstanding",
            Criterion::QuestionAddressing => "questionaddressing",
            Criterion::CriticalAnalysis => "criticalanalysis",
            Criterion::TextualEvidence => "textualevidence",
            Criterion::OverallPerformance => "overallperformance",
            Criterion::WritingQuality => "writingquality",
        }
    }

    /// 展示标题
    pub fn title(self) -> &'static str {
        match self {
            Criterion::ContentUnderstanding => "Content Understanding",
            Criterion::QuestionAddressing => "Question Addressing",
            Criterion::CriticalAnalysis => "Critical Analysis",
            Criterion::TextualEvidence => "Textual Evidence",
            Criterion::OverallPerformance => "Overall Performance",
            Criterion::WritingQuality => "Writing Quality",
        }
    }

    /// 判断一个键属于哪种命名形式
    pub fn classify(key: &str) -> KeyForm {
        if let Some(c) = CANONICAL_KEYS.get(key) {
            KeyForm::Canonical(*c)
        } else if let Some(c) = LEGACY_KEYS.get(key) {
            KeyForm::Legacy(*c)
        } else {
            KeyForm::Unknown
        }
    }

    /// 从任一命名形式解析维度
    pub fn from_key(key: &str) -> Option<Self> {
        match Self::classify(key) {
            KeyForm::Canonical(c) | KeyForm::Legacy(c) => Some(c),
            KeyForm::Unknown => None,
        }
    }

    /// 某个分数在该维度下的评分细则描述
    pub fn describe_score(self, max_score: u32, score: u32) -> String {
        RubricLevel::for_score(max_score, score).describe(self.title())
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// 两个键是否指向同一个维度（规范键和旧版键视为同一维度，未知键只认字面相等）
pub fn same_criterion(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (Criterion::from_key(a), Criterion::from_key(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// 未知维度键的展示标题：`some_new_metric` -> `Some New Metric`
pub fn display_title(key: &str) -> String {
    match Criterion::from_key(key) {
        Some(c) => c.title().to_string(),
        None => key
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// 评分细则档位
///
/// 由 (满分, 分数) 纯函数计算：0 分和满分各有专门措辞，
/// 其余按 ≥80%、≥50%、其它 三档划分。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricLevel {
    Inadequate,
    Low,
    Developing,
    Proficient,
    Exemplary,
}

impl RubricLevel {
    pub fn for_score(max_score: u32, score: u32) -> Self {
        if score == 0 {
            return RubricLevel::Inadequate;
        }
        if max_score == 0 || score >= max_score {
            return RubricLevel::Exemplary;
        }
        let ratio = score as f64 / max_score as f64;
        if ratio >= 0.8 {
            RubricLevel::Proficient
        } else if ratio >= 0.5 {
            RubricLevel::Developing
        } else {
            RubricLevel::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RubricLevel::Inadequate => "Inadequate",
            RubricLevel::Low => "Limited",
            RubricLevel::Developing => "Developing",
            RubricLevel::Proficient => "Proficient",
            RubricLevel::Exemplary => "Exemplary",
        }
    }

    pub fn describe(self, title: &str) -> String {
        let title = title.to_lowercase();
        match self {
            RubricLevel::Inadequate => format!("Inadequate: shows no meaningful {}", title),
            RubricLevel::Low => format!("Limited: shows minimal or inconsistent {}", title),
            RubricLevel::Developing => format!("Developing: shows partial {}", title),
            RubricLevel::Proficient => format!("Proficient: shows clear and solid {}", title),
            RubricLevel::Exemplary => format!("Exemplary: shows thorough, insightful {}", title),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_both_forms() {
        assert_eq!(
            Criterion::classify("textual_evidence"),
            KeyForm::Canonical(Criterion::TextualEvidence)
        );
        assert_eq!(
            Criterion::classify("textualevidence"),
            KeyForm::Legacy(Criterion::TextualEvidence)
        );
        assert_eq!(Criterion::classify("clarity"), KeyForm::Unknown);
    }

    #[test]
    fn test_key_tables_agree() {
        for c in Criterion::ALL {
            assert_eq!(Criterion::from_key(c.canonical_key()), Some(c));
            assert_eq!(Criterion::from_key(c.legacy_key()), Some(c));
            assert_eq!(c.legacy_key(), c.canonical_key().replace('_', ""));
        }
    }

    #[test]
    fn test_rubric_level_tiers() {
        assert_eq!(RubricLevel::for_score(4, 0), RubricLevel::Inadequate);
        assert_eq!(RubricLevel::for_score(4, 1), RubricLevel::Low);
        assert_eq!(RubricLevel::for_score(4, 2), RubricLevel::Developing);
        assert_eq!(RubricLevel::for_score(4, 3), RubricLevel::Developing);
        assert_eq!(RubricLevel::for_score(4, 4), RubricLevel::Exemplary);
        assert_eq!(RubricLevel::for_score(5, 4), RubricLevel::Proficient);
        assert_eq!(RubricLevel::for_score(3, 2), RubricLevel::Developing);
        assert_eq!(RubricLevel::for_score(3, 1), RubricLevel::Low);
    }

    #[test]
    fn test_same_criterion() {
        assert!(same_criterion("writing_quality", "writingquality"));
        assert!(same_criterion("clarity", "clarity"));
        assert!(!same_criterion("clarity", "Clarity"));
        assert!(!same_criterion("writing_quality", "textual_evidence"));
    }

    #[test]
    fn test_display_title_for_unknown_key() {
        assert_eq!(display_title("clarity"), "Clarity");
        assert_eq!(display_title("use_of_sources"), "Use Of Sources");
        assert_eq!(display_title("writingquality"), "Writing Quality");
    }
}
