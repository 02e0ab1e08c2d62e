//! 评阅会话 - 流程层
//!
//! 核心职责：一次评阅的完整流程
//!
//! 1. 打开某个学生的某篇作文，记录初始展示分数
//! 2. 评阅人逐个维度改分，`TouchTracker` 记录哪些维度被改动过
//! 3. 保存：组装 `ReviewerOverride` → 合并 → 替换索引中的条目
//!
//! 会话独占自己的索引，不与其它会话共享状态。

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::index::StudentEssayIndex;
use crate::models::criterion::same_criterion;
use crate::models::review::{ReviewerOverride, TouchedCriteria};
use crate::models::submission::Submission;
use crate::services::OverrideMerger;
use crate::workflow::review_view::SubmissionView;

/// 记录本次评阅中被改动过的维度
///
/// 与初始值不同即视为改动；改回初始值后仍保持改动状态。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TouchTracker {
    initial: BTreeMap<String, u32>,
    touched: TouchedCriteria,
}

impl TouchTracker {
    pub fn from_submission(submission: &Submission) -> Self {
        Self {
            initial: submission
                .score_records
                .iter()
                .map(|r| (r.key.clone(), r.score))
                .collect(),
            touched: TouchedCriteria::new(),
        }
    }

    /// 记录一次编辑，返回该维度当前是否处于已改动状态
    pub fn record_edit(&mut self, key: &str, value: u32) -> bool {
        if self.initial.get(key) != Some(&value) {
            self.touched.insert(key.to_string());
        }
        self.is_touched(key)
    }

    pub fn is_touched(&self, key: &str) -> bool {
        self.touched.contains(key)
    }

    pub fn touched(&self) -> &TouchedCriteria {
        &self.touched
    }
}

/// 当前打开的作文
#[derive(Debug, Clone)]
struct ActiveEssay {
    student_id: String,
    essay_type: String,
    draft: BTreeMap<String, u32>,
    tracker: TouchTracker,
}

impl ActiveEssay {
    fn open(submission: &Submission) -> Self {
        Self {
            student_id: submission.student_id.clone(),
            essay_type: submission.essay_type.clone(),
            draft: submission
                .score_records
                .iter()
                .map(|r| (r.key.clone(), r.score))
                .collect(),
            tracker: TouchTracker::from_submission(submission),
        }
    }

    /// 同一维度的另一种写法归到草稿中已有的键上
    fn resolve_key(&self, key: &str) -> String {
        self.draft
            .keys()
            .find(|k| same_criterion(k, key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

/// 评阅会话
pub struct ReviewSession {
    index: StudentEssayIndex,
    merger: OverrideMerger,
    active: Option<ActiveEssay>,
}

impl ReviewSession {
    pub fn new(index: StudentEssayIndex) -> Self {
        Self {
            index,
            merger: OverrideMerger::new(),
            active: None,
        }
    }

    pub fn index(&self) -> &StudentEssayIndex {
        &self.index
    }

    pub fn into_index(self) -> StudentEssayIndex {
        self.index
    }

    /// 打开学生的作文；不指定类型时打开首次出现的那篇
    pub fn open(&mut self, student_id: &str, essay_type: Option<&str>) -> Option<&Submission> {
        let group = self.index.group(student_id)?;
        let submission = match essay_type {
            Some(t) => group.get(t)?,
            None => group.primary(),
        };
        self.active = Some(ActiveEssay::open(submission));
        Some(submission)
    }

    /// 切换当前学生的作文类型，未保存的改动会被丢弃
    pub fn select_essay_type(&mut self, essay_type: &str) -> Option<&Submission> {
        let student_id = self.active.as_ref()?.student_id.clone();
        let submission = self.index.select_essay_type(&student_id, essay_type)?;
        self.active = Some(ActiveEssay::open(submission));
        Some(submission)
    }

    pub fn active(&self) -> Option<&Submission> {
        let active = self.active.as_ref()?;
        self.index.get(&active.student_id, &active.essay_type)
    }

    /// 当前作文的展示数据
    pub fn view(&self) -> Option<SubmissionView> {
        let submission = self.active()?;
        let essay_types = self
            .index
            .essay_types(&submission.student_id)
            .into_iter()
            .map(str::to_string)
            .collect();
        Some(SubmissionView::build(submission, essay_types))
    }

    /// 修改一个维度的分数（草稿），返回该维度是否已被改动
    pub fn set_score(&mut self, key: &str, value: u32) -> Result<bool> {
        let Some(active) = self.active.as_mut() else {
            bail!("没有打开的作文，无法改分");
        };
        let key = active.resolve_key(key);
        active.draft.insert(key.clone(), value);
        Ok(active.tracker.record_edit(&key, value))
    }

    pub fn touched(&self) -> Option<&TouchedCriteria> {
        self.active.as_ref().map(|a| a.tracker.touched())
    }

    /// 保存当前草稿
    pub fn save_override(&mut self, overall_feedback: Option<String>) -> Result<&Submission> {
        let Some(active) = self.active.as_ref() else {
            bail!("没有打开的作文，无法保存");
        };

        let review = ReviewerOverride {
            student_id: active.student_id.clone(),
            essay_type: Some(active.essay_type.clone()),
            scores: active.draft.clone(),
            touched: active.tracker.touched().clone(),
            overall_feedback,
            file_path: None,
        };
        self.apply_override(&review)
    }

    /// 应用一份改分（会话内保存或从文件加载）
    pub fn apply_override(&mut self, review: &ReviewerOverride) -> Result<&Submission> {
        let Some(group) = self.index.group(&review.student_id) else {
            bail!("改分对应的学生不存在: {}", review.student_id);
        };
        let current = match review.essay_type.as_deref() {
            Some(essay_type) => match group.get(essay_type) {
                Some(s) => s,
                None => bail!(
                    "学生 {} 没有作文类型 {}",
                    review.student_id,
                    essay_type
                ),
            },
            None => group.primary(),
        };

        if review.touched.is_empty() && review.overall_feedback.is_none() {
            warn!("学生 {} 的改分没有任何改动", review.student_id);
        }

        let merged = self.merger.merge(current, review);
        let student_id = merged.student_id.clone();
        let essay_type = merged.essay_type.clone();
        self.index.upsert(merged);

        // 保存后以新结果作为下一轮编辑的起点
        if let Some(active) = self.active.as_mut() {
            if active.student_id == student_id && active.essay_type == essay_type {
                if let Some(updated) = self.index.get(&student_id, &essay_type) {
                    *active = ActiveEssay::open(updated);
                }
            }
        }

        info!("💾 已保存学生 {} ({}) 的改分", student_id, essay_type);
        match self.index.get(&student_id, &essay_type) {
            Some(s) => Ok(s),
            None => bail!("保存后未找到学生 {} 的作文", student_id),
        }
    }
}
