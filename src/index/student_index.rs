use std::collections::HashMap;

use tracing::debug;

use crate::models::submission::Submission;

/// upsert 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// 新学生
    Inserted,
    /// 同一 (学生, 作文类型) 的旧结果被替换
    Replaced,
    /// 已有学生新增了一种作文类型
    AddedEssayType,
}

/// 同一学生的所有作文，每种作文类型最多一篇，按首次出现顺序排列
#[derive(Debug, Clone, PartialEq)]
pub struct StudentEssayGroup {
    student_id: String,
    essays: Vec<Submission>,
}

impl StudentEssayGroup {
    fn new(submission: Submission) -> Self {
        Self {
            student_id: submission.student_id.clone(),
            essays: vec![submission],
        }
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn essays(&self) -> &[Submission] {
        &self.essays
    }

    /// 首次出现的作文，作为该学生的代表条目
    pub fn primary(&self) -> &Submission {
        &self.essays[0]
    }

    pub fn essay_types(&self) -> Vec<&str> {
        self.essays.iter().map(|s| s.essay_type.as_str()).collect()
    }

    pub fn get(&self, essay_type: &str) -> Option<&Submission> {
        self.essays.iter().find(|s| s.essay_type == essay_type)
    }

    fn upsert(&mut self, submission: Submission) -> UpsertOutcome {
        match self
            .essays
            .iter_mut()
            .find(|s| s.essay_type == submission.essay_type)
        {
            Some(slot) => {
                *slot = submission;
                UpsertOutcome::Replaced
            }
            None => {
                self.essays.push(submission);
                UpsertOutcome::AddedEssayType
            }
        }
    }
}

/// 学生/作文索引
///
/// 按学生编号分组、组内按作文类型区分；同一 (学生, 作文类型) 只保留一条。
/// 学生顺序即首次插入顺序，重复插入不会改变顺序。
#[derive(Debug, Clone, Default)]
pub struct StudentEssayIndex {
    groups: Vec<StudentEssayGroup>,
    positions: HashMap<String, usize>,
}

impl StudentEssayIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或替换 (学生, 作文类型) 对应的条目
    pub fn upsert(&mut self, submission: Submission) -> UpsertOutcome {
        if let Some(&pos) = self.positions.get(&submission.student_id) {
            let outcome = self.groups[pos].upsert(submission);
            debug!("索引更新: 学生 {} -> {:?}", self.groups[pos].student_id, outcome);
            return outcome;
        }

        self.positions
            .insert(submission.student_id.clone(), self.groups.len());
        self.groups.push(StudentEssayGroup::new(submission));
        UpsertOutcome::Inserted
    }

    /// 批量插入
    pub fn extend<I: IntoIterator<Item = Submission>>(&mut self, submissions: I) {
        for submission in submissions {
            self.upsert(submission);
        }
    }

    /// 每个学生一条：取首次出现的作文
    pub fn list_unique(&self) -> Vec<&Submission> {
        self.groups.iter().map(StudentEssayGroup::primary).collect()
    }

    /// 该学生的所有作文类型（按首次出现顺序）
    pub fn essay_types(&self, student_id: &str) -> Vec<&str> {
        self.group(student_id)
            .map(StudentEssayGroup::essay_types)
            .unwrap_or_default()
    }

    /// 按学生编号、作文类型、评分细则名称搜索（不区分大小写）
    ///
    /// 每个学生最多返回一条：第一篇命中的作文。空查询返回全部学生。
    pub fn filter_by_search(&self, query: &str) -> Vec<&Submission> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.list_unique();
        }

        self.groups
            .iter()
            .filter_map(|group| {
                group.essays.iter().find(|s| {
                    s.student_id.to_lowercase().contains(&query)
                        || s.essay_type.to_lowercase().contains(&query)
                        || s.rubric_display_name().to_lowercase().contains(&query)
                })
            })
            .collect()
    }

    /// 选中某个学生的某种作文类型，不修改索引
    pub fn select_essay_type(&self, student_id: &str, essay_type: &str) -> Option<&Submission> {
        self.group(student_id)?.get(essay_type)
    }

    pub fn get(&self, student_id: &str, essay_type: &str) -> Option<&Submission> {
        self.select_essay_type(student_id, essay_type)
    }

    pub fn group(&self, student_id: &str) -> Option<&StudentEssayGroup> {
        self.positions.get(student_id).map(|&pos| &self.groups[pos])
    }

    pub fn groups(&self) -> &[StudentEssayGroup] {
        &self.groups
    }

    /// 所有作文，按学生顺序展开
    pub fn submissions(&self) -> impl Iterator<Item = &Submission> {
        self.groups.iter().flat_map(|g| g.essays.iter())
    }

    /// 学生数
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// 作文总数
    pub fn essay_count(&self) -> usize {
        self.groups.iter().map(|g| g.essays.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::submission::fixtures::{ai_record, submission};

    fn sub(student_id: &str, essay_type: &str, score: u32) -> Submission {
        submission(student_id, essay_type, vec![ai_record("clarity", score)])
    }

    #[test]
    fn test_two_essay_types_one_top_level_entry() {
        let mut index = StudentEssayIndex::new();
        assert_eq!(index.upsert(sub("S1", "Narrative", 2)), UpsertOutcome::Inserted);
        assert_eq!(
            index.upsert(sub("S1", "Argumentative", 3)),
            UpsertOutcome::AddedEssayType
        );

        let unique = index.list_unique();
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].essay_type, "Narrative");
        assert_eq!(index.essay_types("S1"), vec!["Narrative", "Argumentative"]);
        assert_eq!(index.essay_count(), 2);
    }

    #[test]
    fn test_same_pair_replaces() {
        let mut index = StudentEssayIndex::new();
        index.upsert(sub("S1", "Narrative", 2));
        index.upsert(sub("S2", "Narrative", 1));
        assert_eq!(index.upsert(sub("S1", "Narrative", 4)), UpsertOutcome::Replaced);

        assert_eq!(index.len(), 2);
        assert_eq!(index.essay_count(), 2);
        assert_eq!(index.get("S1", "Narrative").unwrap().aggregate_score(), 4);
        // 顺序不变
        assert_eq!(index.list_unique()[0].student_id, "S1");
    }

    #[test]
    fn test_filter_by_search() {
        let mut index = StudentEssayIndex::new();
        index.upsert(sub("ALPHA-1", "Narrative", 2));
        let mut winter = sub("BETA-2", "Source Dependent Responses", 3);
        winter.content_id = "Winter_Hibiscus_Grade10_20250812_180450".to_string();
        index.upsert(winter);
        index.upsert(sub("BETA-2", "Narrative", 1));

        let hits = index.filter_by_search("alpha");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].student_id, "ALPHA-1");

        let hits = index.filter_by_search("winter hibiscus");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].essay_type, "Source Dependent Responses");

        // 同一学生只返回第一篇命中
        let hits = index.filter_by_search("NARRATIVE");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].student_id, "BETA-2");
        assert_eq!(hits[1].essay_type, "Narrative");

        assert_eq!(index.filter_by_search("  ").len(), 2);
        assert!(index.filter_by_search("gamma").is_empty());
    }

    #[test]
    fn test_select_essay_type_is_read_only() {
        let mut index = StudentEssayIndex::new();
        index.upsert(sub("S1", "Narrative", 2));
        index.upsert(sub("S1", "Argumentative", 3));

        let selected = index.select_essay_type("S1", "Argumentative").unwrap();
        assert_eq!(selected.aggregate_score(), 3);
        assert!(index.select_essay_type("S1", "Poetry").is_none());
        assert!(index.select_essay_type("S9", "Narrative").is_none());
        assert_eq!(index.list_unique()[0].essay_type, "Narrative");
    }
}
