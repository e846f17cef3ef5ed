//! 代码样式转换服务 - 业务能力层

use crate::error::MarkupError;
use crate::infrastructure::document::{attr, create_element, is_tag, move_children};
use crate::infrastructure::{Document, NodeRef};
use tracing::debug;

const CODE_BLOCK: &str = "Code Block";
const INLINE_CODE: &str = "Inline Code";

fn code_style(span: &NodeRef) -> Option<&'static str> {
    let style = attr(span, "data-custom-style").or_else(|| attr(span, "class"))?;
    [CODE_BLOCK, INLINE_CODE].into_iter().find(|known| *known == style)
}

/// 把 "Code Block" 片段改写为 `<pre>`，"Inline Code" 片段改写为 `<code>`
///
/// 先删除 Code Block 中手动换行产生的 `<br>`，再替换外层元素。
pub fn transform_inline_code(doc: &mut Document) -> Result<(), MarkupError> {
    let spans: Vec<(NodeRef, &'static str)> = doc
        .select("span")?
        .into_iter()
        .filter_map(|span| code_style(&span).map(|style| (span, style)))
        .collect();

    let breaks: Vec<NodeRef> = spans
        .iter()
        .filter(|(_, style)| *style == CODE_BLOCK)
        .flat_map(|(span, _)| span.children().filter(|child| is_tag(child, "br")).collect::<Vec<_>>())
        .collect();
    for br in breaks {
        br.detach();
    }

    debug!("转换 {} 个代码片段", spans.len());
    for (span, style) in spans {
        let wrapper = create_element(if style == CODE_BLOCK { "pre" } else { "code" })?;
        span.insert_before(wrapper.clone());
        move_children(&span, &wrapper);
        span.detach();
    }

    Ok(())
}
