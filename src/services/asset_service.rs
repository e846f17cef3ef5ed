//! 图片资源上传服务 - 业务能力层
//!
//! 把文档中引用本地文件的 `<img>` 上传到题库的资源存储，并把 `src` 改写为公开地址。
//! 单张图片失败不会中断整篇文档，失败项记录在 [`AssetReport`] 中。

use super::id_allocator::IdAllocator;
use crate::clients::ItemBankApi;
use crate::error::AppResult;
use crate::infrastructure::document::{attr, set_attr};
use crate::infrastructure::{Document, NodeRef};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 单张图片的失败原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFailure {
    pub src: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetReport {
    /// (本地路径, 公开地址)
    pub uploaded: Vec<(String, String)>,
    pub failures: Vec<AssetFailure>,
}

impl AssetReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, src: &str, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("⚠️ 图片 {} 上传失败，保留本地路径: {}", src, reason);
        self.failures.push(AssetFailure {
            src: src.to_string(),
            reason,
        });
    }
}

fn is_local_source(src: &str) -> bool {
    let src = src.trim();
    !src.is_empty()
        && !["http://", "https://", "data:", "//"]
            .iter()
            .any(|prefix| src.starts_with(prefix))
}

/// 按首次出现的顺序收集本地图片，同一路径只上传一次
fn collect_local_images(doc: &Document) -> AppResult<Vec<(String, Vec<NodeRef>)>> {
    let mut groups: Vec<(String, Vec<NodeRef>)> = Vec::new();
    for img in doc.select("img[src]")? {
        let Some(src) = attr(&img, "src").filter(|s| is_local_source(s)) else {
            continue;
        };
        match groups.iter_mut().find(|(existing, _)| *existing == src) {
            Some((_, nodes)) => nodes.push(img),
            None => groups.push((src, vec![img])),
        }
    }
    Ok(groups)
}

fn resolve_path(src: &str, base_dir: Option<&Path>) -> PathBuf {
    let path = Path::new(src);
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

pub struct AssetService<'a> {
    api: &'a dyn ItemBankApi,
    allocator: IdAllocator<'a>,
}

impl<'a> AssetService<'a> {
    pub fn new(api: &'a dyn ItemBankApi, retry_limit: usize) -> Self {
        Self {
            api,
            allocator: IdAllocator::new(api, retry_limit),
        }
    }

    /// 上传文档中的本地图片并改写 `src`
    ///
    /// 相对路径按 `base_dir` 解析。只有 key 分配失败会返回错误。
    pub async fn substitute(&self, doc: &mut Document, base_dir: Option<&Path>) -> AppResult<AssetReport> {
        let mut report = AssetReport::default();
        let groups = collect_local_images(doc)?;
        if groups.is_empty() {
            return Ok(report);
        }

        info!("发现 {} 个本地图片，开始上传", groups.len());
        let sources: Vec<String> = groups.iter().map(|(src, _)| src.clone()).collect();
        let keys = self.allocator.allocate_file_keys(&sources).await?;

        let destinations = match self.api.request_upload_destinations(&keys).await {
            Ok(destinations) => destinations,
            Err(e) => {
                for src in &sources {
                    report.fail(src, format!("无法获取上传地址: {}", e));
                }
                return Ok(report);
            }
        };

        for (index, (src, nodes)) in groups.into_iter().enumerate() {
            let Some(destination) = destinations.get(index) else {
                report.fail(&src, "题库没有返回对应的上传地址");
                continue;
            };

            let path = resolve_path(&src, base_dir);
            match self
                .api
                .put_bytes(&path, &destination.content_type, &destination.upload)
                .await
            {
                Ok(true) => {
                    for node in &nodes {
                        set_attr(node, "src", destination.public.clone());
                    }
                    if !self.api.head_check(&destination.public).await {
                        warn!("⚠️ 公开地址暂时无法访问: {}", destination.public);
                    }
                    report.uploaded.push((src, destination.public.clone()));
                }
                Ok(false) => report.fail(&src, "上传地址返回失败状态"),
                Err(e) => report.fail(&src, e.to_string()),
            }
        }

        info!(
            "✓ 图片上传完成: 成功 {}, 失败 {}",
            report.uploaded.len(),
            report.failures.len()
        );
        Ok(report)
    }
}
