//! 评分批次处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一个评分批次的完整对账。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：日志文件、启动信息
//! 2. **获取评分结果**：配置了评分服务时在线评分，否则读取本地结果文件
//! 3. **解析与索引**：解析为 `Submission`，按 (学生, 作文类型) 建立索引
//! 4. **应用改分**：加载改分目录下的 TOML 文件，逐个合并
//! 5. **输出**：写 Markdown 报告，汇总统计
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单篇作文的细节
//! - **向下委托**：解析交给 services，改分交给 workflow::ReviewSession
//! - 评分服务调用是唯一的挂起点，其余步骤都是同步的内存操作

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::clients::GradingClient;
use crate::config::Config;
use crate::error::AppError;
use crate::index::StudentEssayIndex;
use crate::models::raw::{GradingFailure, RawGradingResponse};
use crate::models::uploaded::UploadedEssays;
use crate::models::{load_all_overrides, load_grading_response, load_uploaded_essays};
use crate::orchestrator::report;
use crate::services::SubmissionParser;
use crate::utils::logging::{self, ReviewStats};
use crate::workflow::ReviewSession;

/// 对账完成后的批次
pub struct ReconciledBatch {
    pub batch_id: Option<String>,
    pub index: StudentEssayIndex,
    pub failures: Vec<GradingFailure>,
    pub stats: ReviewStats,
}

/// 应用主结构
pub struct App {
    config: Config,
    parser: SubmissionParser,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;

        // 初始化日志文件
        logging::init_log_file(&config.output_log_file)?;

        logging::log_startup(&config);

        let parser = SubmissionParser::new(&config);
        Ok(Self { config, parser })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<ReconciledBatch> {
        let batch = self.reconcile().await?;

        if batch.index.is_empty() {
            warn!("⚠️ 没有可对账的作文，程序结束");
        }

        self.write_report(&batch).await?;
        self.write_log_lines(&batch)?;

        logging::print_final_stats(
            &batch.stats,
            &self.config.output_log_file,
            &self.config.report_file,
        );

        Ok(batch)
    }

    /// 获取评分结果 → 解析 → 索引 → 应用改分
    pub async fn reconcile(&self) -> Result<ReconciledBatch> {
        let essays = load_uploaded_essays(Path::new(&self.config.uploaded_essays_file)).await?;
        let response = self.fetch_results(&essays).await?;

        let parsed = self.parser.parse_response(response, &essays);
        let mut index = StudentEssayIndex::new();
        index.extend(parsed.submissions);
        logging::log_batch_loaded(index.len(), index.essay_count(), parsed.failures.len());
        if self.config.verbose_logging {
            self.log_submissions(&index);
        }

        let (index, applied, failed) = self.apply_overrides(index).await?;

        let stats = ReviewStats {
            essays: index.essay_count(),
            overrides_applied: applied,
            overrides_failed: failed,
            manual_overrides: index.submissions().filter(|s| s.has_manual_override()).count(),
            flagged: index.submissions().filter(|s| s.flagged).count(),
            immediate_attention: index
                .submissions()
                .filter(|s| s.requires_immediate_attention())
                .count(),
        };

        Ok(ReconciledBatch {
            batch_id: parsed.batch_id,
            index,
            failures: parsed.failures,
            stats,
        })
    }

    /// 在线评分或读取本地结果文件
    async fn fetch_results(&self, essays: &UploadedEssays) -> Result<RawGradingResponse> {
        if self.config.grading_api_url.is_some() && !essays.is_empty() {
            let client = GradingClient::new(&self.config)?;
            let batch_id = format!("batch_{}", Utc::now().format("%Y%m%d_%H%M%S"));
            let response = client.grade(essays, &batch_id).await?;
            return Ok(response);
        }

        if self.config.grading_api_url.is_some() {
            warn!("⚠️ 已配置评分服务但没有上传的作文，改为读取本地结果文件");
        }
        info!("\n📁 正在读取评分结果: {}", self.config.results_file);
        load_grading_response(Path::new(&self.config.results_file)).await
    }

    /// 加载并应用所有改分文件，单个失败不影响其它
    async fn apply_overrides(
        &self,
        index: StudentEssayIndex,
    ) -> Result<(StudentEssayIndex, usize, usize)> {
        let overrides = load_all_overrides(&self.config.overrides_folder).await?;
        if overrides.is_empty() {
            return Ok((index, 0, 0));
        }

        info!("✍️ 正在应用 {} 份改分...", overrides.len());
        let mut session = ReviewSession::new(index);
        let (mut applied, mut failed) = (0, 0);
        for review in &overrides {
            match session.apply_override(review) {
                Ok(_) => applied += 1,
                Err(e) => {
                    warn!(
                        "❌ 改分应用失败 {}: {}",
                        review.file_path.as_deref().unwrap_or("-"),
                        e
                    );
                    failed += 1;
                }
            }
        }

        Ok((session.into_index(), applied, failed))
    }

    async fn write_report(&self, batch: &ReconciledBatch) -> Result<()> {
        let content = report::build_report(batch.batch_id.as_deref(), &batch.index, &batch.failures);
        tokio::fs::write(&self.config.report_file, content)
            .await
            .map_err(|e| AppError::file_write_failed(&self.config.report_file, e))?;
        info!("📄 报告已写入: {}", self.config.report_file);
        Ok(())
    }

    fn log_submissions(&self, index: &StudentEssayIndex) {
        for sub in index.submissions() {
            info!(
                "📝 {} | {} | {} | 置信度 {}% | {}",
                sub.student_id,
                sub.essay_type,
                sub.score_string(),
                sub.confidence,
                logging::truncate_text(&sub.essay_response, 40)
            );
        }
    }

    fn write_log_lines(&self, batch: &ReconciledBatch) -> Result<()> {
        for sub in batch.index.submissions() {
            let line = format!(
                "{} | {} | {} | {}",
                sub.student_id,
                sub.essay_type,
                sub.score_string(),
                logging::truncate_text(sub.overall_feedback(), 60)
            );
            logging::append_log_line(&self.config.output_log_file, &line)?;
        }
        Ok(())
    }
}
