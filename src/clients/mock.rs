//! 单元测试用的内存题库

use super::{Action, ApiResponse, ItemBankApi, Namespace, ResponseMeta};
use crate::error::AppResult;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub action: Action,
    pub endpoint: String,
    pub request: Value,
}

type Responder = Box<dyn Fn(&str, &Value) -> Option<Value> + Send + Sync>;

#[derive(Default)]
pub struct MockItemBank {
    calls: Mutex<Vec<RecordedCall>>,
    collisions: Mutex<usize>,
    failing_uploads: Mutex<HashSet<String>>,
    responder: Option<Responder>,
    puts: Mutex<Vec<String>>,
}

impl MockItemBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// 前 `n` 次唯一性检查报告冲突
    pub fn with_collisions(self, n: usize) -> Self {
        *self.collisions.lock().unwrap() = n;
        self
    }

    /// 文件名为 `name` 的资源上传失败
    pub fn failing_upload(self, name: &str) -> Self {
        self.failing_uploads.lock().unwrap().insert(name.to_string());
        self
    }

    /// 按 (端点, 请求) 决定 get 请求返回的数据，返回 `None` 时走默认逻辑
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str, &Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, action: Action, endpoint: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.action == action && c.endpoint == endpoint)
            .collect()
    }

    pub fn uploaded_paths(&self) -> Vec<String> {
        self.puts.lock().unwrap().clone()
    }

    fn take_collision(&self) -> bool {
        let mut remaining = self.collisions.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl ItemBankApi for MockItemBank {
    async fn submit(&self, action: Action, endpoint: &str, request: &Value) -> AppResult<ApiResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            action,
            endpoint: endpoint.to_string(),
            request: request.clone(),
        });

        if action != Action::Get {
            return Ok(ApiResponse::ok(Value::Null));
        }

        if let Some(data) = self.responder.as_ref().and_then(|r| r(endpoint, request)) {
            let records = data.as_array().map(|a| a.len() as u64);
            return Ok(ApiResponse {
                meta: ResponseMeta {
                    status: true,
                    records,
                    ..ResponseMeta::default()
                },
                data,
            });
        }

        if endpoint == Namespace::Assets.endpoint() {
            let keys = request["file_names"].as_array().cloned().unwrap_or_default();
            let data: Vec<Value> = keys
                .iter()
                .filter_map(Value::as_str)
                .map(|key| {
                    json!({
                        "upload": format!("https://upload.test/{}", key),
                        "public": format!("https://cdn.test/{}", key),
                        "content_type": "image/png",
                    })
                })
                .collect();
            return Ok(ApiResponse::ok(Value::Array(data)));
        }

        if request.get("references").is_some() {
            let records = u64::from(self.take_collision());
            return Ok(ApiResponse {
                meta: ResponseMeta {
                    status: true,
                    records: Some(records),
                    ..ResponseMeta::default()
                },
                data: json!([]),
            });
        }

        Ok(ApiResponse::ok(json!([])))
    }

    async fn put_bytes(&self, path: &Path, _content_type: &str, _upload_url: &str) -> AppResult<bool> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.puts.lock().unwrap().push(path.display().to_string());
        Ok(!self.failing_uploads.lock().unwrap().contains(&name))
    }

    async fn head_check(&self, _url: &str) -> bool {
        self.take_collision()
    }
}
