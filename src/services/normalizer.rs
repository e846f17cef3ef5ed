//! 标记规整服务 - 业务能力层
//!
//! 在结构解析之前原地清理转换器输出的文档树：
//! 1. 去掉注释和纯空白文本节点
//! 2. 过滤 class 属性，去掉全部 style 属性
//! 3. 表格整理后移入前一个兄弟节点
//! 4. 把 "Continued" 段落合并进前一个兄弟节点

use crate::error::{AppResult, StructureError};
use crate::infrastructure::document::{attr, is_tag, move_children, previous_element, remove_attr, set_attr};
use crate::infrastructure::{Document, NodeRef};
use tracing::debug;

/// 追加到每个表格上的展示用 class
pub const TABLE_CLASSES: &str = "table table-bordered lrn_width_auto";

/// 除了包含 Quiz / Question 的样式名之外，允许保留的 class 值
const PERMITTED_CLASSES: &[&str] = &["Code Block", "Inline Code", TABLE_CLASSES];

const CONTINUED: &str = "Continued";

const CONTINUED_SELECTOR: &str = r#"[data-custom-style*="Continued"], [class*="Continued"]"#;

/// 执行全部规整步骤
pub fn normalize(doc: &mut Document) -> AppResult<()> {
    strip_noise(doc);
    prune_attributes(doc)?;
    relocate_tables(doc)?;
    merge_continuations(doc)?;
    Ok(())
}

/// 去掉注释和只含空白的文本节点（全部由不间断空格组成的文本保留）
pub fn strip_noise(doc: &mut Document) {
    let noise: Vec<NodeRef> = doc
        .root()
        .descendants()
        .filter(|node| {
            node.as_comment().is_some()
                || node
                    .as_text()
                    .is_some_and(|text| is_droppable_whitespace(&text.borrow()))
        })
        .collect();

    debug!("去掉 {} 个注释/空白节点", noise.len());
    for node in noise {
        node.detach();
    }
}

fn is_droppable_whitespace(text: &str) -> bool {
    text.chars().all(char::is_whitespace) && !text.chars().all(|c| c == '\u{a0}')
}

fn is_permitted_class(value: &str) -> bool {
    value.contains("Quiz") || value.contains("Question") || PERMITTED_CLASSES.contains(&value)
}

/// 只保留白名单中的 class 值，去掉所有 style
pub fn prune_attributes(doc: &mut Document) -> AppResult<()> {
    for node in doc.select("[class], [style]")? {
        if attr(&node, "class").is_some_and(|class| !is_permitted_class(&class)) {
            remove_attr(&node, "class");
        }
        remove_attr(&node, "style");
    }
    Ok(())
}

/// 整理表格：去掉 colgroup、追加 class，顶层表格移入前一个兄弟节点的末尾
///
/// 嵌在其他元素里的表格已经属于某个块，保持原位。
pub fn relocate_tables(doc: &mut Document) -> AppResult<()> {
    let tables = doc.select("table")?;

    for table in &tables {
        let colgroups: Vec<NodeRef> = table
            .children()
            .filter(|child| is_tag(child, "colgroup"))
            .collect();
        for colgroup in colgroups {
            colgroup.detach();
        }

        let existing = attr(table, "class").unwrap_or_default();
        let classes = format!("{} {}", existing, TABLE_CLASSES).trim().to_string();
        set_attr(table, "class", classes);
    }

    for table in tables {
        if table.parent().as_ref() != Some(doc.root()) {
            continue;
        }
        let target = previous_element(&table).ok_or_else(|| StructureError::MissingPredecessor {
            marker: "table".to_string(),
        })?;
        target.append(table);
    }

    Ok(())
}

fn continuation_marker(node: &NodeRef) -> Option<String> {
    [attr(node, "data-custom-style"), attr(node, "class")]
        .into_iter()
        .flatten()
        .find(|value| value.contains(CONTINUED))
}

/// 把续写段落的子节点按顺序移到前一个兄弟节点末尾并删除续写段落
///
/// 按文档逆序处理，链式续写（Stem, Continued, Continued）最终全部合并进第一个节点。
pub fn merge_continuations(doc: &mut Document) -> AppResult<()> {
    loop {
        let continued = doc.select(CONTINUED_SELECTOR)?;
        if continued.is_empty() {
            return Ok(());
        }

        debug!("合并 {} 个续写段落", continued.len());
        for node in continued.iter().rev() {
            let target = previous_element(node).ok_or_else(|| StructureError::MissingPredecessor {
                marker: continuation_marker(node).unwrap_or_else(|| CONTINUED.to_string()),
            })?;
            move_children(node, &target);
            node.detach();
        }
    }
}
