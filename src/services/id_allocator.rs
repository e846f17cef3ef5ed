//! 唯一 ID 分配服务 - 业务能力层
//!
//! 生成 uuid v4，并向题库确认没有冲突；冲突时整批重新生成，超过次数上限即失败。

use crate::clients::{ItemBankApi, Namespace};
use crate::error::{AppError, AppResult};
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct IdAllocator<'a> {
    api: &'a dyn ItemBankApi,
    retry_limit: usize,
}

impl<'a> IdAllocator<'a> {
    pub fn new(api: &'a dyn ItemBankApi, retry_limit: usize) -> Self {
        Self { api, retry_limit }
    }

    /// 为 `namespace` 分配 `count` 个不冲突的 ID
    pub async fn allocate(&self, namespace: Namespace, count: usize) -> AppResult<Vec<String>> {
        self.allocate_with(namespace, count, |_| Uuid::new_v4().to_string())
            .await
    }

    /// 为资源文件分配 key，保留原文件扩展名
    pub async fn allocate_file_keys(&self, file_names: &[String]) -> AppResult<Vec<String>> {
        let extensions: Vec<Option<String>> = file_names
            .iter()
            .map(|name| {
                Path::new(name)
                    .extension()
                    .map(|ext| ext.to_string_lossy().to_lowercase())
            })
            .collect();

        self.allocate_with(Namespace::Assets, file_names.len(), |index| {
            let id = Uuid::new_v4().to_string();
            match &extensions[index] {
                Some(ext) => format!("{}.{}", id, ext),
                None => id,
            }
        })
        .await
    }

    async fn allocate_with<F>(&self, namespace: Namespace, count: usize, make: F) -> AppResult<Vec<String>>
    where
        F: Fn(usize) -> String + Send + Sync,
    {
        if count == 0 {
            return Ok(Vec::new());
        }

        for attempt in 1..=self.retry_limit {
            let ids: Vec<String> = (0..count).map(&make).collect();
            let existing = self.api.count_existing(namespace, &ids).await?;
            if existing == 0 {
                debug!("✓ 分配 {} 个 {} ID", count, namespace);
                return Ok(ids);
            }
            warn!(
                "{} 个 {} ID 已存在 (尝试 {}/{}), 重新生成...",
                existing, namespace, attempt, self.retry_limit
            );
        }

        Err(AppError::IdentifiersExhausted {
            namespace: namespace.to_string(),
            attempts: self.retry_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::mock::MockItemBank;
    use crate::clients::Action;
    use std::collections::HashSet;

    #[tokio::test]
    async fn allocates_unique_ids_after_collisions() {
        let api = MockItemBank::new().with_collisions(2);
        let allocator = IdAllocator::new(&api, 5);

        let ids = allocator.allocate(Namespace::Questions, 3).await.unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 3);
        assert!(ids.iter().all(|id| Uuid::parse_str(id).is_ok()));
        assert_eq!(api.calls_to(Action::Get, "questions").len(), 3);
    }

    #[tokio::test]
    async fn fails_after_retry_limit() {
        let api = MockItemBank::new().with_collisions(10);
        let allocator = IdAllocator::new(&api, 5);

        let err = allocator.allocate(Namespace::Items, 2).await.unwrap_err();
        match err {
            AppError::IdentifiersExhausted { namespace, attempts } => {
                assert_eq!(namespace, "items");
                assert_eq!(attempts, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(api.calls().len(), 5);
    }

    #[tokio::test]
    async fn zero_ids_needs_no_request() {
        let api = MockItemBank::new();
        let ids = IdAllocator::new(&api, 5).allocate(Namespace::Activities, 0).await.unwrap();
        assert!(ids.is_empty());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn file_keys_keep_extension() {
        let api = MockItemBank::new();
        let keys = IdAllocator::new(&api, 5)
            .allocate_file_keys(&["media/image1.PNG".to_string(), "media/raw".to_string()])
            .await
            .unwrap();
        assert!(keys[0].ends_with(".png"));
        assert!(!keys[1].contains('.'));
    }
}
