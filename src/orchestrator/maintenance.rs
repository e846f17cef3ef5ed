//! 题库维护任务 - 编排层
//!
//! 针对已经导入的 activity 批量操作：
//! - 给 activity 中的全部 item 追加标签
//! - 归档 activity 及其 item（被多个 activity 共用的 item 跳过）
//!
//! 每个任务分为 plan（只读，生成审阅文本）和 apply（写入）两步，中间由调用方确认。

use super::submission::{get_entities, submit_chunked};
use crate::clients::{Action, ItemBankApi, Namespace};
use crate::error::AppResult;
use crate::models::TagSet;
use serde_json::{json, Value};
use tracing::{info, warn};

const ITEM_TAGS_ENDPOINT: &str = "items/tags";
const ARCHIVED: &str = "archived";

/// 读取 activity 并按顺序收集其中的 item ref ID（去重）
pub async fn item_refs_of_activities(api: &dyn ItemBankApi, activity_refs: &[String]) -> AppResult<Vec<String>> {
    let activities = get_entities(api, Namespace::Activities.endpoint(), activity_refs).await?;
    if activities.len() < activity_refs.len() {
        warn!(
            "⚠️ 请求 {} 个 activity，题库只返回 {} 个",
            activity_refs.len(),
            activities.len()
        );
    }

    let mut refs: Vec<String> = Vec::new();
    for activity in &activities {
        let items = activity["data"]["items"].as_array().cloned().unwrap_or_default();
        for item in items {
            let reference = match &item {
                Value::String(s) => Some(s.clone()),
                Value::Object(_) => item["reference"].as_str().map(str::to_string),
                _ => None,
            };
            if let Some(reference) = reference {
                if !refs.contains(&reference) {
                    refs.push(reference);
                }
            }
        }
    }
    Ok(refs)
}

// ========== 追加标签 ==========

#[derive(Debug, Clone)]
pub struct TagAppendPlan {
    pub activities: Vec<String>,
    pub items: Vec<String>,
    pub tags: TagSet,
}

impl TagAppendPlan {
    pub fn review_text(&self) -> String {
        format!(
            "Activities with items to be tagged: {}\n\nItems to be tagged: {}\n\nTags to be appended:\n{}",
            self.activities.join(","),
            self.items.join(","),
            serde_json::to_string(&self.tags).unwrap_or_default()
        )
    }
}

pub async fn plan_tag_append(api: &dyn ItemBankApi, activity_refs: &[String], tags: TagSet) -> AppResult<TagAppendPlan> {
    let items = item_refs_of_activities(api, activity_refs).await?;
    info!("✓ {} 个 activity 共包含 {} 个 item", activity_refs.len(), items.len());
    Ok(TagAppendPlan {
        activities: activity_refs.to_vec(),
        items,
        tags,
    })
}

/// 以 `update` 动作把标签追加到每个 item
pub async fn apply_tag_append(api: &dyn ItemBankApi, plan: &TagAppendPlan, batch_size: usize) -> AppResult<usize> {
    let records: Vec<Value> = plan
        .items
        .iter()
        .map(|reference| json!({ "reference": reference, "tags": plan.tags }))
        .collect();
    let updated = submit_chunked(api, Action::Update, ITEM_TAGS_ENDPOINT, "items", &records, batch_size).await?;
    info!("✓ 已为 {} 个 item 追加标签", updated);
    Ok(updated)
}

// ========== 归档 ==========

#[derive(Debug, Clone, Default)]
pub struct ArchivePlan {
    pub activities: Vec<String>,
    pub items: Vec<String>,
    /// 被多个 activity 使用而跳过的 item
    pub skipped: Vec<String>,
}

impl ArchivePlan {
    pub fn review_text(&self) -> String {
        format!(
            "Activities to be archived: {}\n\nItems to be archived: {}",
            self.activities.join(","),
            self.items.join(",")
        )
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveStats {
    pub activities: usize,
    pub items: usize,
}

pub async fn plan_archive(api: &dyn ItemBankApi, activity_refs: &[String]) -> AppResult<ArchivePlan> {
    let candidates = item_refs_of_activities(api, activity_refs).await?;
    let mut plan = ArchivePlan {
        activities: activity_refs.to_vec(),
        ..ArchivePlan::default()
    };

    for item in candidates {
        let request = json!({ "item_references": { "all": [item] } });
        let response = api
            .submit(Action::Get, Namespace::Activities.endpoint(), &request)
            .await?;
        let used_by = response.data.as_array().map_or(0, Vec::len);
        if used_by > 1 {
            warn!("⚠️ item {} 被 {} 个 activity 使用，跳过", item, used_by);
            plan.skipped.push(item);
        } else {
            plan.items.push(item);
        }
    }
    Ok(plan)
}

pub async fn apply_archive(api: &dyn ItemBankApi, plan: &ArchivePlan, batch_size: usize) -> AppResult<ArchiveStats> {
    let activities = set_status(api, Namespace::Activities, &plan.activities, batch_size).await?;
    let items = set_status(api, Namespace::Items, &plan.items, batch_size).await?;
    info!("✓ 已归档 {} 个 activity, {} 个 item", activities, items);
    Ok(ArchiveStats { activities, items })
}

/// 读取完整实体，改写 `status` 后以 `set` 写回
async fn set_status(api: &dyn ItemBankApi, namespace: Namespace, refs: &[String], batch_size: usize) -> AppResult<usize> {
    let endpoint = namespace.endpoint();
    let mut entities = get_entities(api, endpoint, refs).await?;
    entities.retain_mut(|entity| match entity.get_mut("status") {
        Some(status) => {
            *status = json!(ARCHIVED);
            true
        }
        None => {
            warn!(
                "⚠️ {} 没有 status 字段，跳过: {}",
                namespace,
                entity["reference"].as_str().unwrap_or("?")
            );
            false
        }
    });
    submit_chunked(api, Action::Set, endpoint, endpoint, &entities, batch_size).await
}
