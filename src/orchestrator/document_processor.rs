//! 单个文档处理器 - 编排层
//!
//! 转换器输出的 HTML → 规整 → 行内代码 → 图片上传 → 测验列表。
//! 结构错误在上传任何图片之前就会暴露。

use crate::clients::ItemBankApi;
use crate::config::ParseOptions;
use crate::error::AppResult;
use crate::infrastructure::Document;
use crate::models::Quiz;
use crate::services::{normalize, transform_inline_code, AssetReport, AssetService};
use crate::workflow::parse_quizzes;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct ProcessedDocument {
    pub quizzes: Vec<Quiz>,
    pub assets: AssetReport,
}

/// 处理一份 HTML 文档
///
/// # 参数
/// - `markup`: 转换器输出的 HTML 片段
/// - `media_base`: 相对图片路径的解析目录
/// - `retry_limit`: 资源 key 分配的最大尝试次数
pub async fn process_markup(
    api: &dyn ItemBankApi,
    markup: &str,
    options: &ParseOptions,
    media_base: Option<&Path>,
    retry_limit: usize,
) -> AppResult<ProcessedDocument> {
    let mut doc = Document::parse(markup)?;
    normalize(&mut doc)?;
    transform_inline_code(&mut doc)?;

    // 先做一次结构检查，避免为有问题的文档上传图片
    let draft = parse_quizzes(&doc, options)?;
    debug!("结构检查通过: {} 个测验", draft.len());

    let assets = AssetService::new(api, retry_limit)
        .substitute(&mut doc, media_base)
        .await?;
    if !assets.is_clean() {
        warn!(
            "⚠️ {} 张图片上传失败，题目中保留了本地路径",
            assets.failures.len()
        );
    }

    let quizzes = parse_quizzes(&doc, options)?;
    Ok(ProcessedDocument { quizzes, assets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::mock::MockItemBank;
    use crate::error::{AppError, StructureError};
    use pretty_assertions::assert_eq;

    const DOC: &str = r#"<h1 data-custom-style="QuizTitle">Tables</h1>
<div data-custom-style="QuestionStem"><p>Which <span data-custom-style="Inline Code">Vec</span>?</p><p><img src="media/image1.png" /></p></div>
<table><colgroup><col /></colgroup><tr><td>1</td></tr></table>
<div data-custom-style="QuestionOption"><p>A. first [Correct]</p></div>
<div data-custom-style="QuestionOption"><p>B. second</p></div>
"#;

    fn options() -> ParseOptions {
        ParseOptions {
            has_rationales: false,
            ..ParseOptions::default()
        }
    }

    #[tokio::test]
    async fn runs_full_pipeline() {
        let api = MockItemBank::new();
        let processed = process_markup(&api, DOC, &options(), Some(Path::new("/docs")), 5)
            .await
            .unwrap();

        assert!(processed.assets.is_clean());
        let stem = &processed.quizzes[0].questions[0].stem;
        assert!(stem.starts_with("<p>Which <code>Vec</code>?</p>"));
        assert!(stem.contains("src=\"https://cdn.test/"));
        assert!(stem.ends_with("<table class=\"table table-bordered lrn_width_auto\"><tbody><tr><td>1</td></tr></tbody></table>"));
        assert_eq!(api.uploaded_paths(), vec!["/docs/media/image1.png"]);
    }

    #[tokio::test]
    async fn structure_errors_stop_before_uploads() {
        let api = MockItemBank::new();
        let broken = DOC.replace(" [Correct]", "");
        let err = process_markup(&api, &broken, &options(), None, 5).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Structure(StructureError::MissingCorrectFlag { .. })
        ));
        assert!(api.calls().is_empty());
    }
}
