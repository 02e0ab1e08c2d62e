//! 维度键归一化 - 业务能力层
//!
//! 两套历史命名方式并存时，每个维度只保留一个条目：
//! - 规范键存在时直接胜出
//! - 规范键缺失时才保留旧版键
//! - 未知键原样透传（兼容新维度）
//!
//! 只看键的身份，不看值的好坏：规范键即使是 0 分也会胜出。

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::models::criterion::{Criterion, KeyForm};

/// 归一化维度键，结果与输入顺序无关
pub fn normalize_criterion_keys<V>(input: BTreeMap<String, V>) -> BTreeMap<String, V> {
    let claimed: BTreeSet<Criterion> = input
        .keys()
        .filter_map(|k| match Criterion::classify(k) {
            KeyForm::Canonical(c) => Some(c),
            _ => None,
        })
        .collect();

    input
        .into_iter()
        .filter(|(key, _)| match Criterion::classify(key) {
            KeyForm::Legacy(c) if claimed.contains(&c) => {
                debug!("旧版键 {} 被规范键 {} 覆盖", key, c.canonical_key());
                false
            }
            _ => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_canonical_wins_over_legacy() {
        let out = normalize_criterion_keys(map(&[
            ("textualevidence", 3),
            ("textual_evidence", 1),
        ]));
        assert_eq!(out.len(), 1);
        assert_eq!(out.get("textual_evidence"), Some(&1));
    }

    #[test]
    fn test_canonical_wins_even_when_zero() {
        let out = normalize_criterion_keys(map(&[
            ("writing_quality", 0),
            ("writingquality", 4),
        ]));
        assert_eq!(out, map(&[("writing_quality", 0)]));
    }

    #[test]
    fn test_legacy_kept_when_alone() {
        let out = normalize_criterion_keys(map(&[("contentunderstanding", 2)]));
        assert_eq!(out, map(&[("contentunderstanding", 2)]));
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        let out = normalize_criterion_keys(map(&[
            ("clarity", 3),
            ("critical_analysis", 2),
            ("criticalanalysis", 1),
            ("organizationflow", 2),
        ]));
        assert_eq!(
            out,
            map(&[("clarity", 3), ("critical_analysis", 2), ("organizationflow", 2)])
        );
    }

    #[test]
    fn test_independent_of_insertion_order() {
        let mut a = BTreeMap::new();
        a.insert("question_addressing".to_string(), 1);
        a.insert("questionaddressing".to_string(), 3);
        let mut b = BTreeMap::new();
        b.insert("questionaddressing".to_string(), 3);
        b.insert("question_addressing".to_string(), 1);
        assert_eq!(normalize_criterion_keys(a), normalize_criterion_keys(b));
    }
}
