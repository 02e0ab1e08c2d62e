use anyhow::{Context, Result};
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化 tracing 日志
///
/// 默认 info 级别，可通过 `RUST_LOG` 覆盖。重复调用不会报错。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件（覆盖写入文件头）
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n作文评分对账日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法初始化日志文件: {}", log_file_path))?;
    Ok(())
}

/// 追加一行到日志文件
pub fn append_log_line(log_file_path: &str, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path))?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 作文评分对账模式");
    info!("📄 评分结果: {}", config.results_file);
    match &config.grading_api_url {
        Some(url) => info!("🌐 评分服务: {}", url),
        None => info!("🌐 评分服务: 未配置，仅读取本地结果"),
    }
    info!("✍️ 改分目录: {}", config.overrides_folder);
    info!("{}", "=".repeat(60));
}

/// 记录评分结果加载信息
pub fn log_batch_loaded(students: usize, essays: usize, failures: usize) {
    info!("✓ 解析完成: {} 名学生, {} 篇作文", students, essays);
    if failures > 0 {
        info!("⚠️ 评分服务报告了 {} 个失败条目", failures);
    }
}

/// 对账统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReviewStats {
    pub essays: usize,
    pub overrides_applied: usize,
    pub overrides_failed: usize,
    pub manual_overrides: usize,
    pub flagged: usize,
    pub immediate_attention: usize,
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &ReviewStats, log_file_path: &str, report_file: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 对账完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📝 作文总数: {}", stats.essays);
    info!(
        "✅ 改分应用: {} (失败 {})",
        stats.overrides_applied, stats.overrides_failed
    );
    info!("✍️ 含人工改分: {}", stats.manual_overrides);
    info!("🚩 被标记: {}", stats.flagged);
    if stats.immediate_attention > 0 {
        info!("🆘 需要立即关注: {}", stats.immediate_attention);
    }
    info!("{}", "=".repeat(60));
    info!("\n报告已保存至: {}", report_file);
    info!("日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("短文本", 5), "短文本");
        assert_eq!(truncate_text("这是一段很长的作文内容", 4), "这是一段...");
    }

    #[test]
    fn test_log_file_header_and_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        let path = path.to_str().unwrap();

        init_log_file(path).unwrap();
        append_log_line(path, "S1 3/4").unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("作文评分对账日志"));
        assert!(content.ends_with("S1 3/4\n"));
    }
}
