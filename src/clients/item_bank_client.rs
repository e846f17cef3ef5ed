/// 题库 Data API 客户端
///
/// 每个请求以表单形式 POST `security` / `request` / `action` 三个字段，
/// `security` 中带有对请求内容的 SHA-256 签名。
use super::{Action, ApiResponse, ItemBankApi};
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

pub struct ItemBankClient {
    http: reqwest::Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
    domain: String,
    user_id: String,
    max_retries: usize,
}

impl ItemBankClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.item_bank_base_url.trim_end_matches('/').to_string(),
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
            domain: config.domain.clone(),
            user_id: config.user_id.clone(),
            max_retries: 3,
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/itembank/{}", self.base_url, endpoint)
    }

    /// `key_domain_timestamp_user_secret_request_action` 的 SHA-256 十六进制摘要
    fn sign(&self, timestamp: &str, request: &str, action: Action) -> String {
        let parts = [
            self.consumer_key.as_str(),
            self.domain.as_str(),
            timestamp,
            self.user_id.as_str(),
            self.consumer_secret.as_str(),
            request,
            action.as_str(),
        ];
        let digest = Sha256::digest(parts.join("_").as_bytes());
        format!("{:x}", digest)
    }

    fn security_packet(&self, request: &str, action: Action) -> Value {
        let timestamp = chrono::Utc::now().format("%Y%m%d-%H%M").to_string();
        json!({
            "consumer_key": self.consumer_key,
            "domain": self.domain,
            "timestamp": timestamp,
            "user_id": self.user_id,
            "signature": self.sign(&timestamp, request, action),
        })
    }

    async fn post_once(&self, action: Action, endpoint: &str, request: &str) -> AppResult<ApiResponse> {
        let security = self.security_packet(request, action).to_string();
        let form = [
            ("security", security.as_str()),
            ("request", request),
            ("action", action.as_str()),
        ];

        let response = self
            .http
            .post(self.endpoint_url(endpoint))
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        if !status.is_success() {
            return Err(ApiError::BadResponse {
                endpoint: endpoint.to_string(),
                status: Some(status.as_u16()),
                message: Some(body),
            }
            .into());
        }

        let parsed: ApiResponse = serde_json::from_str(&body)?;
        if !parsed.meta.status {
            return Err(ApiError::BadResponse {
                endpoint: endpoint.to_string(),
                status: Some(status.as_u16()),
                message: parsed.meta.message,
            }
            .into());
        }
        Ok(parsed)
    }
}

#[async_trait]
impl ItemBankApi for ItemBankClient {
    async fn submit(&self, action: Action, endpoint: &str, request: &Value) -> AppResult<ApiResponse> {
        let request = serde_json::to_string(request)?;
        debug!("📤 {} itembank/{} ({} 字节)", action, endpoint, request.len());

        let mut last_error = None;
        for attempt in 0..self.max_retries {
            match self.post_once(action, endpoint, &request).await {
                Ok(response) => {
                    if let Some(next) = &response.meta.next {
                        debug!("itembank/{} 还有下一页 (next = {})，未继续获取", endpoint, next);
                    }
                    return Ok(response);
                }
                // 只有网络错误才重试
                Err(AppError::Api(ApiError::RequestFailed { endpoint: failed, source })) => {
                    warn!(
                        "请求 itembank/{} 失败 (尝试 {}/{}): {}, 等待 2 秒后重试...",
                        failed,
                        attempt + 1,
                        self.max_retries,
                        source
                    );
                    last_error = Some(AppError::Api(ApiError::RequestFailed {
                        endpoint: failed,
                        source,
                    }));
                    sleep(Duration::from_secs(2)).await;
                }
                Err(other) => return Err(other),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ApiError::EmptyResponse {
                endpoint: endpoint.to_string(),
            }
            .into()
        }))
    }

    async fn put_bytes(&self, path: &Path, content_type: &str, upload_url: &str) -> AppResult<bool> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

        let response = self
            .http
            .put(upload_url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(upload_url, e))?;

        Ok(response.status().is_success())
    }

    async fn head_check(&self, url: &str) -> bool {
        match self.http.head(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("HEAD {} 失败: {}", url, e);
                false
            }
        }
    }
}
