use crate::error::{AppError, AppResult, ConfigError};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 评分结果 JSON 文件（评分服务的响应体）
    pub results_file: String,
    /// 原始上传的作文数据（用于补全缺失字段）
    pub uploaded_essays_file: String,
    /// 评阅人人工改分 TOML 文件目录
    pub overrides_folder: String,
    /// 对账报告输出文件
    pub report_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 作文类型缺失时使用的默认标签
    pub default_essay_type: String,
    // --- 评分服务配置 ---
    /// 评分服务地址；为空时只读取本地结果文件
    pub grading_api_url: Option<String>,
    /// 评分请求超时（秒）
    pub grading_timeout_secs: u64,
    /// 等待评分时输出耗时提示的间隔（秒）
    pub progress_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            results_file: "grading_results.json".to_string(),
            uploaded_essays_file: "uploaded_essays.json".to_string(),
            overrides_folder: "overrides".to_string(),
            report_file: "review_report.md".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            default_essay_type: "Unknown Essay Type".to_string(),
            grading_api_url: None,
            grading_timeout_secs: 300,
            progress_interval_secs: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            results_file: std::env::var("RESULTS_FILE").unwrap_or(default.results_file),
            uploaded_essays_file: std::env::var("UPLOADED_ESSAYS_FILE").unwrap_or(default.uploaded_essays_file),
            overrides_folder: std::env::var("OVERRIDES_FOLDER").unwrap_or(default.overrides_folder),
            report_file: std::env::var("REPORT_FILE").unwrap_or(default.report_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            default_essay_type: std::env::var("DEFAULT_ESSAY_TYPE").unwrap_or(default.default_essay_type),
            grading_api_url: std::env::var("GRADING_API_URL").ok().filter(|v| !v.trim().is_empty()).or(default.grading_api_url),
            grading_timeout_secs: std::env::var("GRADING_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.grading_timeout_secs),
            progress_interval_secs: std::env::var("PROGRESS_INTERVAL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.progress_interval_secs),
        }
    }
}

impl Config {
    /// 校验会影响运行的配置项
    pub fn validate(&self) -> AppResult<()> {
        if let Some(url) = &self.grading_api_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(invalid("GRADING_API_URL", url, "必须以 http:// 或 https:// 开头"));
            }
        }
        if self.grading_timeout_secs == 0 {
            return Err(invalid("GRADING_TIMEOUT_SECS", "0", "超时时间必须大于 0"));
        }
        if self.default_essay_type.trim().is_empty() {
            return Err(invalid("DEFAULT_ESSAY_TYPE", "", "默认作文类型不能为空"));
        }
        Ok(())
    }
}

fn invalid(name: &str, value: &str, reason: &str) -> AppError {
    AppError::Config(ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    })
}
