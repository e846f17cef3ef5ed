//! 文本清理服务 - 业务能力层
//!
//! 对题干、选项、解析的标记片段做统一的文本规整

use regex::Regex;
use std::sync::LazyLock;

static STRONG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</?strong>").unwrap());

static CORRECT_FLAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[Correct[^\]]*\]").unwrap());

/// 开头的编号（`A.`、`3.`），允许前面有一个行内标签
static ITEM_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\s*<.[^>]*>)?\s*?((?:[A-Z]|[0-9]+)\.\s*)").unwrap()
});

static PARA_PRE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p>\s*(<pre>)|(</pre>)\s*</p>").unwrap());

static MARK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</?mark>").unwrap());

/// 片段类型，只有选项会去掉正确答案标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Stem,
    Option,
    Rationale,
}

/// 原始选项文本中是否带有 `[Correct...]` 标记
pub fn has_correct_flag(raw: &str) -> bool {
    CORRECT_FLAG_RE.is_match(raw)
}

/// 清理一个标记片段
///
/// 顺序：去掉 `<strong>`，去掉正确答案标记（仅选项），去掉一个开头编号，
/// 折叠包在 `<pre>` 外面的 `<p>`，按配置去掉 `<mark>`。
pub fn clean_fragment(text: &str, kind: FragmentKind, strip_marks: bool) -> String {
    let mut text = STRONG_RE.replace_all(text, "").into_owned();

    if kind == FragmentKind::Option {
        text = CORRECT_FLAG_RE.replace_all(&text, "").trim().to_string();
    }

    // 编号只去掉一次
    text = ITEM_PREFIX_RE.replace(&text, "${1}").into_owned();

    // 必须在去编号之后
    text = PARA_PRE_RE.replace_all(&text, "${1}${2}").into_owned();

    if strip_marks {
        text = MARK_RE.replace_all(&text, "").into_owned();
    }

    text
}
