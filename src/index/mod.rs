//! 学生/作文索引
//!
//! 唯一持有分组结构；条目是只读快照，改分后整体替换。

pub mod student_index;

pub use student_index::{StudentEssayGroup, StudentEssayIndex, UpsertOutcome};
