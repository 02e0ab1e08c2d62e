use crate::error::{AppError, FileError};
use crate::models::raw::RawGradingResponse;
use crate::models::uploaded::UploadedEssays;
use anyhow::Result;
use std::path::Path;
use tokio::fs;

/// 从 JSON 文件加载评分服务响应
///
/// 非法 JSON 在这里直接返回错误，不会进入对账流程。
pub async fn load_grading_response(json_file_path: &Path) -> Result<RawGradingResponse> {
    let origin = json_file_path.display().to_string();
    if !json_file_path.exists() {
        return Err(AppError::File(FileError::NotFound { path: origin }).into());
    }
    let content = fs::read_to_string(json_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(&origin, e))?;

    let response = RawGradingResponse::from_json_str(&content, &origin)?;
    Ok(response)
}

/// 加载原始上传的作文数据；文件不存在时返回空集合
pub async fn load_uploaded_essays(json_file_path: &Path) -> Result<UploadedEssays> {
    if !json_file_path.exists() {
        tracing::info!("未找到上传作文文件，跳过: {}", json_file_path.display());
        return Ok(UploadedEssays::default());
    }

    let origin = json_file_path.display().to_string();
    let content = fs::read_to_string(json_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(&origin, e))?;

    let essays = UploadedEssays::from_json_str(&content, &origin)?;
    tracing::info!("成功加载 {} 篇上传作文", essays.len());
    Ok(essays)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::uploaded::EssaySource;

    #[test]
    fn test_load_grading_response_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(&path, r#"{"results": [{"student_id": "S1"}, {"student_id": "S2"}]}"#).unwrap();

        let response = tokio_test::block_on(load_grading_response(&path)).unwrap();
        assert_eq!(response.into_records().len(), 2);
    }

    #[test]
    fn test_invalid_json_surfaces_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(&path, "{ broken").unwrap();

        let err = tokio_test::block_on(load_grading_response(&path)).unwrap_err();
        let app_err = err.downcast_ref::<AppError>().expect("应为 AppError");
        assert!(app_err.is_blocking_input());
    }

    #[test]
    fn test_missing_results_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = tokio_test::block_on(load_grading_response(&dir.path().join("none.json")))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::File(FileError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_missing_uploaded_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let essays =
            tokio_test::block_on(load_uploaded_essays(&dir.path().join("none.json"))).unwrap();
        assert!(essays.is_empty());
    }

    #[test]
    fn test_load_uploaded_essays() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uploads.json");
        std::fs::write(&path, r#"[{"student_id": "S1", "essay_type": "Narrative"}]"#).unwrap();

        let essays = tokio_test::block_on(load_uploaded_essays(&path)).unwrap();
        assert_eq!(essays.lookup("S1", None).unwrap().essay_type, "Narrative");
    }

    #[test]
    fn test_unreadable_file_reports_path() {
        // 目录存在但无法按文本读取
        let dir = tempfile::tempdir().unwrap();
        let err = tokio_test::block_on(load_grading_response(dir.path())).unwrap_err();
        let app_err = err.downcast_ref::<AppError>().unwrap();
        assert!(matches!(app_err, AppError::File(FileError::ReadFailed { path, .. }) if !path.is_empty()));
    }
}
