//! 按作文类型汇总统计

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::submission::Submission;

/// 单个作文类型的统计结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EssayTypeSummary {
    pub essay_type: String,
    pub total_essays: usize,
    /// 平均分的均值，保留 2 位小数
    pub average_score: f64,
    /// 取整后的平均分 -> 篇数
    pub score_distribution: BTreeMap<u32, usize>,
    /// 平均置信度，保留 1 位小数
    pub average_confidence: f64,
    pub flagged_count: usize,
}

/// 按作文类型汇总，结果按类型名排序
pub fn summarize_by_essay_type(submissions: &[Submission]) -> Vec<EssayTypeSummary> {
    let mut groups: BTreeMap<&str, Vec<&Submission>> = BTreeMap::new();
    for sub in submissions {
        groups.entry(sub.essay_type.as_str()).or_default().push(sub);
    }

    groups
        .into_iter()
        .map(|(essay_type, subs)| {
            let total = subs.len();
            let score_sum: f64 = subs.iter().map(|s| s.mean_score()).sum();
            let confidence_sum: f64 = subs.iter().map(|s| s.confidence as f64).sum();

            let mut score_distribution = BTreeMap::new();
            for s in &subs {
                *score_distribution.entry(s.mean_display()).or_insert(0) += 1;
            }

            EssayTypeSummary {
                essay_type: essay_type.to_string(),
                total_essays: total,
                average_score: round_to(score_sum / total as f64, 2),
                score_distribution,
                average_confidence: round_to(confidence_sum / total as f64, 1),
                flagged_count: subs.iter().filter(|s| s.flagged).count(),
            }
        })
        .collect()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::submission::fixtures::{ai_record, submission};

    #[test]
    fn test_summary_per_essay_type() {
        let mut a = submission("S1", "Narrative", vec![ai_record("x", 3), ai_record("y", 2)]);
        a.confidence = 90;
        a.flagged = true;
        let mut b = submission("S2", "Narrative", vec![ai_record("x", 1)]);
        b.confidence = 75;
        let c = submission("S3", "Argumentative", vec![ai_record("x", 4)]);

        let summary = summarize_by_essay_type(&[a, b, c]);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].essay_type, "Argumentative");

        let narrative = &summary[1];
        assert_eq!(narrative.total_essays, 2);
        // (2.5 + 1.0) / 2
        assert!((narrative.average_score - 1.75).abs() < 1e-9);
        assert!((narrative.average_confidence - 82.5).abs() < 1e-9);
        assert_eq!(narrative.flagged_count, 1);
        assert_eq!(narrative.score_distribution.get(&3), Some(&1));
        assert_eq!(narrative.score_distribution.get(&1), Some(&1));
    }

    #[test]
    fn test_empty_input() {
        assert!(summarize_by_essay_type(&[]).is_empty());
    }
}
