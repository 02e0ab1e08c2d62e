//! 人工改分合并 - 业务能力层
//!
//! 把评阅人提交的完整分数表合并进已有的 `Submission`，返回新的值。
//!
//! ## 规则
//! 1. 已有维度：更新分数；本次被改动过的标记为 human，否则来源不变；AI 理由原样保留
//! 2. 没有记录但被改动过的维度：新建 human 记录（包括未知维度键），两种写法只建一条
//!
//! 同一维度在分数表里有两种写法时，以评阅人实际改动的那种为准。
//! 3. 只要存在 human 维度就切换到平均分制（满分 3），且不可逆
//! 4. 评阅人总评覆盖展示用总评，AI 原始总评单独保留
//!
//! 用同样的分数表重复合并，结果除时间戳外完全一致。

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::models::criterion::same_criterion;
use crate::models::review::ReviewerOverride;
use crate::models::score::{Provenance, ScoreMode, ScoreRecord};
use crate::models::submission::Submission;
use crate::services::normalizer::normalize_criterion_keys;

/// 人工改分合并器
#[derive(Debug, Default, Clone, Copy)]
pub struct OverrideMerger;

impl OverrideMerger {
    pub fn new() -> Self {
        Self
    }

    /// 合并改分，以当前时间作为评阅时间
    pub fn merge(&self, submission: &Submission, review: &ReviewerOverride) -> Submission {
        self.merge_at(submission, review, Utc::now())
    }

    /// 合并改分，使用指定的评阅时间
    pub fn merge_at(
        &self,
        submission: &Submission,
        review: &ReviewerOverride,
        reviewed_at: DateTime<Utc>,
    ) -> Submission {
        let mut records = submission.score_records.clone();

        // 1. 更新已有维度
        for record in records.iter_mut() {
            let touched = is_touched(review, &record.key);
            let new_score = touched_score(review, &record.key)
                .or_else(|| review.scores.get(&record.key).copied())
                .or_else(|| {
                    review
                        .scores
                        .iter()
                        .find(|(k, _)| record.matches_key(k))
                        .map(|(_, s)| *s)
                });

            match new_score {
                Some(score) => {
                    record.score = score;
                    if touched {
                        record.provenance = Provenance::Human;
                    }
                }
                None if touched => {
                    warn!("维度 {} 被标记为已改动，但分数表中没有对应分数，保持不变", record.key);
                }
                None => {}
            }
        }

        // 2. 为 AI 遗漏、评阅人补打分的维度新建记录，同一维度只建一条
        for (key, score) in normalize_criterion_keys(review.scores.clone()) {
            if records.iter().any(|r| r.matches_key(&key)) {
                continue;
            }
            if is_touched(review, &key) {
                let score = touched_score(review, &key).unwrap_or(score);
                debug!("新建人工评分维度 {} = {}", key, score);
                records.push(ScoreRecord::new(
                    key,
                    score,
                    Provenance::Human,
                    String::new(),
                    ScoreMode::MEAN_MAX_SCORE,
                ));
            } else {
                debug!("维度 {} 不存在且未被改动，忽略", key);
            }
        }

        // 3. 出现人工评分后永久切换到平均分制
        let mode = if records.iter().any(ScoreRecord::is_human) {
            ScoreMode::Mean
        } else {
            submission.mode
        };
        let max_score = mode.max_score();
        for record in records.iter_mut() {
            if record.score > max_score {
                warn!(
                    "维度 {} 的分数 {} 超出满分 {}，已截断",
                    record.key, record.score, max_score
                );
                record.score = max_score;
            }
            record.max_score = max_score;
        }

        let reviewer_feedback = match review.overall_feedback.as_deref().map(str::trim) {
            Some(text) => Some(text.to_string()),
            None => submission.reviewer_feedback.clone(),
        };

        let merged = Submission {
            mode,
            score_records: records,
            reviewer_feedback,
            reviewed_at: Some(reviewed_at),
            ..submission.clone()
        };

        info!(
            "✍️ 学生 {} ({}) 改分完成: {} 个人工维度, 得分 {}",
            merged.student_id,
            merged.essay_type,
            merged.score_records.iter().filter(|r| r.is_human()).count(),
            merged.score_string()
        );

        merged
    }
}

/// 评阅人是否改动过该维度（任一命名形式）
fn is_touched(review: &ReviewerOverride, key: &str) -> bool {
    review.touched.iter().any(|t| same_criterion(t, key))
}

/// 评阅人实际改动的那种写法对应的分数
fn touched_score(review: &ReviewerOverride, key: &str) -> Option<u32> {
    review
        .touched
        .iter()
        .filter(|t| same_criterion(t, key))
        .find_map(|t| review.scores.get(t).copied())
}
