//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一个评分批次的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 评分批次处理器
//! - 管理应用生命周期（初始化、运行）
//! - 获取评分结果（评分服务或本地文件）
//! - 建立学生/作文索引，应用改分文件
//! - 输出全局统计信息
//!
//! ### `report` - 对账报告
//! - 按作文类型汇总、逐个学生列出分数和来源
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理一个批次)
//!     ↓
//! workflow::ReviewSession (改分流程)
//!     ↓
//! services (能力层：parse / merge / highlight)
//!     ↓
//! models (数据与加载)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管调度，report 管输出格式
//! 2. **向下依赖**：编排层 → workflow → services → models
//! 3. **无业务逻辑**：只做调度和统计，不做具体评分判断

pub mod batch_processor;
pub mod report;

// 重新导出主要类型
pub use batch_processor::{App, ReconciledBatch};
pub use report::build_report;
