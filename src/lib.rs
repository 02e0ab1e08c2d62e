//! # Essay Score Review
//!
//! AI 作文评分结果的人工复核与分数对账
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 数据层（Models）
//! - `models/` - 评分维度、评分记录、作文结果、原始响应、改分
//! - `models/loaders` - 异步加载 JSON 评分结果和 TOML 改分文件
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单篇作文
//! - `normalize_criterion_keys` - 维度键归一化
//! - `SubmissionParser` - 原始评分结果 → `Submission`
//! - `OverrideMerger` - 人工改分合并
//! - `highlight_flagged_spans` - 标记片段高亮
//!
//! ### ③ 索引（Index）
//! - `StudentEssayIndex` - 按学生、作文类型分组，无重复
//!
//! ### ④ 流程层（Workflow）
//! - `ReviewSession` - 一次评阅：打开 → 改分 → 保存
//! - `SubmissionView` - 界面展示数据
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 获取评分结果、建立索引、应用改分、输出报告
//! - `clients/` - 外部评分服务客户端
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::GradingClient;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use index::{StudentEssayGroup, StudentEssayIndex, UpsertOutcome};
pub use models::{
    Criterion, GradingFailure, Provenance, RawGradingResponse, ReviewerOverride, ScoreMode,
    ScoreRecord, Submission, UploadedEssays,
};
pub use orchestrator::{App, ReconciledBatch};
pub use services::{highlight_flagged_spans, normalize_criterion_keys, OverrideMerger, SubmissionParser};
pub use workflow::{ReviewSession, SubmissionView, TouchTracker};
