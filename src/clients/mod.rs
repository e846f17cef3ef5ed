//! 外部协作方接口
//!
//! - [`ItemBankApi`]：题库 Data API（记录读写、资源上传）
//! - [`DocumentConverter`]：docx → HTML 转换器

pub mod converter;
pub mod item_bank_client;
#[cfg(test)]
pub mod mock;

pub use converter::{ConvertOptions, DocumentConverter, PandocConverter};
pub use item_bank_client::ItemBankClient;

use crate::error::{ApiError, AppResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::Path;

/// Data API 请求动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Get,
    Set,
    Update,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Get => "get",
            Action::Set => "set",
            Action::Update => "update",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 题库中的引用命名空间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Questions,
    Items,
    Activities,
    Assets,
}

impl Namespace {
    /// `itembank/` 下的端点
    pub fn endpoint(self) -> &'static str {
        match self {
            Namespace::Questions => "questions",
            Namespace::Items => "items",
            Namespace::Activities => "activities",
            Namespace::Assets => "upload/assets",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub records: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Data API 响应 `{meta, data}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub meta: ResponseMeta,
    #[serde(default)]
    pub data: Value,
}

impl ApiResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            meta: ResponseMeta {
                status: true,
                ..ResponseMeta::default()
            },
            data,
        }
    }
}

/// 资源上传目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadDestination {
    pub upload: String,
    pub public: String,
    pub content_type: String,
}

/// 题库 API 能力
#[async_trait]
pub trait ItemBankApi: Send + Sync {
    /// 发送一次 Data API 请求
    async fn submit(&self, action: Action, endpoint: &str, request: &Value) -> AppResult<ApiResponse>;

    /// 上传文件内容到预签名地址
    async fn put_bytes(&self, path: &Path, content_type: &str, upload_url: &str) -> AppResult<bool>;

    /// 检查公开地址是否可访问
    async fn head_check(&self, url: &str) -> bool;

    /// 一次性为多个资源 key 申请上传地址
    async fn request_upload_destinations(&self, keys: &[String]) -> AppResult<Vec<UploadDestination>> {
        let endpoint = Namespace::Assets.endpoint();
        let response = self
            .submit(Action::Get, endpoint, &json!({ "file_names": keys }))
            .await?;

        if response.data.is_null() {
            return Err(ApiError::EmptyResponse {
                endpoint: endpoint.to_string(),
            }
            .into());
        }

        let destinations: Vec<UploadDestination> = serde_json::from_value(response.data)?;
        Ok(destinations)
    }

    /// 统计给定引用中已经存在于题库的数量
    ///
    /// 资源没有查询接口，以公开地址是否可访问判断。
    async fn count_existing(&self, namespace: Namespace, refs: &[String]) -> AppResult<u64> {
        if namespace == Namespace::Assets {
            let destinations = self.request_upload_destinations(refs).await?;
            let mut existing = 0;
            for destination in &destinations {
                if self.head_check(&destination.public).await {
                    existing += 1;
                }
            }
            return Ok(existing);
        }

        let response = self
            .submit(Action::Get, namespace.endpoint(), &json!({ "references": refs }))
            .await?;
        Ok(response.meta.records.unwrap_or(0))
    }
}
