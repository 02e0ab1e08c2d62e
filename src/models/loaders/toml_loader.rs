use crate::models::review::ReviewerOverride;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载评阅人改分
pub async fn load_override(toml_file_path: &Path) -> Result<ReviewerOverride> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let parsed: ReviewerOverride = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    Ok(parsed.with_file_path(toml_file_path.to_string_lossy().to_string()))
}

/// 从文件夹中加载所有改分 TOML 文件
///
/// 按文件名排序，保证改分的应用顺序稳定；单个文件解析失败只记录警告。
pub async fn load_all_overrides(folder_path: &str) -> Result<Vec<ReviewerOverride>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        tracing::info!("改分目录不存在，跳过: {}", folder_path);
        return Ok(Vec::new());
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut overrides = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载改分: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_override(&path).await {
            Ok(o) => {
                tracing::info!("成功加载 {} 个维度分数", o.scores.len());
                overrides.push(o);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(overrides)
}
