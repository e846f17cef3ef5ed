//! 标记文档树 - 基础设施层
//!
//! 转换器产出的 HTML 由 kuchiki 解析成可修改的 DOM，各阶段在同一棵树上原地修改。
//! [`Document`] 只持有 `<body>`，节点本身直接使用 [`NodeRef`]。

use crate::error::MarkupError;
use kuchiki::traits::*;
use kuchiki::NodeRef;

/// 标记文档
pub struct Document {
    body: NodeRef,
}

impl Document {
    /// 解析 HTML 片段，片段中的顶层节点都挂在 `<body>` 下
    pub fn parse(markup: &str) -> Result<Self, MarkupError> {
        let html = kuchiki::parse_html().one(markup);
        let body = html
            .select_first("body")
            .map_err(|()| MarkupError::MissingBody)?
            .as_node()
            .clone();
        Ok(Self { body })
    }

    pub fn root(&self) -> &NodeRef {
        &self.body
    }

    /// 按文档顺序返回匹配 CSS 选择器的元素
    pub fn select(&self, selector: &str) -> Result<Vec<NodeRef>, MarkupError> {
        select_in(&self.body, selector)
    }

    /// `<body>` 的元素子节点
    pub fn top_level_elements(&self) -> Vec<NodeRef> {
        self.body
            .children()
            .filter(|node| node.as_element().is_some())
            .collect()
    }

    /// 序列化整个文档（`<body>` 的内部标记）
    pub fn to_markup(&self) -> String {
        inner_markup(&self.body)
    }
}

pub fn select_in(node: &NodeRef, selector: &str) -> Result<Vec<NodeRef>, MarkupError> {
    let matches = node.select(selector).map_err(|()| MarkupError::Selector {
        selector: selector.to_string(),
    })?;
    Ok(matches.map(|el| el.as_node().clone()).collect())
}

/// 序列化节点的子节点
pub fn inner_markup(node: &NodeRef) -> String {
    node.children().map(|child| child.to_string()).collect()
}

pub fn is_tag(node: &NodeRef, name: &str) -> bool {
    node.as_element()
        .is_some_and(|el| el.name.local.as_ref() == name)
}

pub fn attr(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()?
        .attributes
        .borrow()
        .get(name)
        .map(str::to_string)
}

pub fn set_attr(node: &NodeRef, name: &str, value: impl Into<String>) {
    if let Some(el) = node.as_element() {
        el.attributes.borrow_mut().insert(name, value.into());
    }
}

pub fn remove_attr(node: &NodeRef, name: &str) {
    if let Some(el) = node.as_element() {
        el.attributes.borrow_mut().remove(name);
    }
}

/// 紧邻的前一个元素兄弟节点（跳过文本）
pub fn previous_element(node: &NodeRef) -> Option<NodeRef> {
    let mut current = node.previous_sibling();
    while let Some(sibling) = current {
        if sibling.as_element().is_some() {
            return Some(sibling);
        }
        current = sibling.previous_sibling();
    }
    None
}

/// 按顺序把 `from` 的全部子节点移动到 `to` 的末尾
pub fn move_children(from: &NodeRef, to: &NodeRef) {
    let children: Vec<NodeRef> = from.children().collect();
    for child in children {
        to.append(child);
    }
}

/// 创建一个不在任何树中的空元素
pub fn create_element(name: &str) -> Result<NodeRef, MarkupError> {
    let scratch = kuchiki::parse_html().one(format!("<{0}></{0}>", name));
    let element = select_in(&scratch, name)?
        .into_iter()
        .next()
        .ok_or_else(|| MarkupError::Selector {
            selector: name.to_string(),
        })?;
    element.detach();
    Ok(element)
}
