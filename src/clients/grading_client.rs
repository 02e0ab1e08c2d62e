/// 评分服务 API 客户端
///
/// 把上传的作文批量提交给外部评分服务，返回原始评分结果。
/// 这是整个流程中唯一会挂起等待的调用。
use std::time::{Duration, Instant};

use serde_json::{json, Value as JsonValue};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::raw::RawGradingResponse;
use crate::models::uploaded::{UploadedEssay, UploadedEssays};

/// 评分服务客户端
pub struct GradingClient {
    client: reqwest::Client,
    endpoint: String,
    progress_interval: Duration,
}

impl GradingClient {
    /// 创建新的评分客户端，未配置服务地址时返回错误
    pub fn new(config: &Config) -> AppResult<Self> {
        let endpoint = config
            .grading_api_url
            .clone()
            .ok_or(AppError::Api(ApiError::EndpointMissing))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.grading_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            progress_interval: Duration::from_secs(config.progress_interval_secs.max(1)),
        })
    }

    /// 请求体：`{"essays": [...], "batch_id": "..."}`，作文按 (学生编号, 作文类型) 排序
    pub fn build_request_body(essays: &UploadedEssays, batch_id: &str) -> JsonValue {
        let mut list: Vec<&UploadedEssay> = essays.iter().collect();
        list.sort_by(|a, b| {
            a.student_id
                .cmp(&b.student_id)
                .then_with(|| a.essay_type.cmp(&b.essay_type))
        });
        json!({
            "essays": list,
            "batch_id": batch_id,
        })
    }

    /// 提交一批作文进行评分
    ///
    /// 等待期间按配置的间隔输出已等待时间。
    pub async fn grade(&self, essays: &UploadedEssays, batch_id: &str) -> AppResult<RawGradingResponse> {
        let body = Self::build_request_body(essays, batch_id);
        info!(
            "📤 提交 {} 篇作文到评分服务 (batch_id: {})",
            essays.len(),
            batch_id
        );
        debug!("评分服务地址: {}", self.endpoint);

        let started = Instant::now();
        let request = self.client.post(&self.endpoint).json(&body).send();
        tokio::pin!(request);

        let mut ticker = tokio::time::interval(self.progress_interval);
        // 第一次 tick 立即返回
        ticker.tick().await;

        let result = loop {
            tokio::select! {
                res = &mut request => break res,
                _ = ticker.tick() => {
                    info!("⏳ 评分进行中... 已等待 {} 秒", started.elapsed().as_secs());
                }
            }
        };

        let response = result.map_err(|e| AppError::api_request_failed(&self.endpoint, e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(&self.endpoint, e))?;

        if !status.is_success() {
            return Err(AppError::Api(ApiError::BadResponse {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
                body: text,
            }));
        }

        info!("📥 评分完成，耗时 {:.1} 秒", started.elapsed().as_secs_f64());
        RawGradingResponse::from_json_str(&text, &self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn essays() -> UploadedEssays {
        UploadedEssays::from_json_str(
            r#"[{"student_id": "S2", "essay_type": "Narrative"}, {"student_id": "S1", "essay_type": "Narrative"}]"#,
            "test",
        )
        .unwrap()
    }

    #[test]
    fn test_new_requires_endpoint() {
        let config = Config::default();
        let err = GradingClient::new(&config).err().unwrap();
        assert!(matches!(err, AppError::Api(ApiError::EndpointMissing)));
    }

    #[test]
    fn test_request_body_shape() {
        let body = GradingClient::build_request_body(&essays(), "batch-1");
        assert_eq!(body["batch_id"], "batch-1");
        let list = body["essays"].as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["student_id"], "S1");
        assert_eq!(list[1]["essay_type"], "Narrative");
    }

    #[test]
    fn test_request_body_sends_every_essay_of_a_student() {
        let essays = UploadedEssays::from_json_str(
            r#"[{"student_id": "S1", "essay_type": "Narrative", "essay_response": "story"},
                {"student_id": "S1", "essay_type": "Argumentative", "essay_response": "claim"}]"#,
            "test",
        )
        .unwrap();
        let body = GradingClient::build_request_body(&essays, "batch-2");
        let list = body["essays"].as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["essay_type"], "Argumentative");
        assert_eq!(list[1]["essay_type"], "Narrative");
    }

    #[tokio::test]
    #[ignore] // 需要真实的评分服务
    async fn test_grade_against_live_service() {
        let mut config = Config::from_env();
        if config.grading_api_url.is_none() {
            config.grading_api_url = Some("http://localhost:3000/grade".to_string());
        }
        let client = GradingClient::new(&config).unwrap();
        let response = client.grade(&essays(), "live-test").await.unwrap();
        assert!(!response.into_records().is_empty());
    }
}
