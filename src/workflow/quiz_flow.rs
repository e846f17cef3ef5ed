//! 测验解析流程 - 流程层
//!
//! 核心职责：把规范化后的文档树拆成测验列表
//!
//! 流程顺序：
//! 1. 找出所有顶层 QuizTitle，各自开启一个测验
//! 2. 从标题往后逐个访问兄弟节点，直到下一个 QuizTitle
//! 3. 按节点的标记类型驱动 [`ParseCtx`] 状态机

use tracing::{debug, warn};

use crate::config::ParseOptions;
use crate::error::StructureError;
use crate::infrastructure::document::inner_markup;
use crate::infrastructure::{Document, NodeRef};
use crate::models::{DifficultyLevel, ElementType, Quiz, QuizKind};
use crate::workflow::parse_ctx::ParseCtx;

/// 测验解析流程
///
/// - 只读文档树，不做任何网络或文件操作
/// - 结构错误直接返回，由编排层决定是否中止
pub struct QuizFlow<'a> {
    options: &'a ParseOptions,
}

impl<'a> QuizFlow<'a> {
    pub fn new(options: &'a ParseOptions) -> Self {
        Self { options }
    }

    pub fn run(&self, doc: &Document) -> Result<Vec<Quiz>, StructureError> {
        let top_level = doc.top_level_elements();

        if self.options.quiz_kind == QuizKind::Diagnostic {
            check_diagnostic_layout(&top_level)?;
        }

        let titles: Vec<&NodeRef> = top_level
            .iter()
            .filter(|node| ElementType::of(node).is_quiz_title())
            .collect();

        if titles.is_empty() {
            warn!("⚠️ 文档中没有找到 QuizTitle 标记");
        }

        let mut quizzes = Vec::with_capacity(titles.len());
        for title in titles {
            let quiz = self.parse_quiz(title)?;
            debug!("✓ 解析测验 \"{}\": {} 道题", quiz.title, quiz.questions.len());
            quizzes.push(quiz);
        }
        Ok(quizzes)
    }

    fn parse_quiz(&self, title: &NodeRef) -> Result<Quiz, StructureError> {
        let mut ctx = ParseCtx::new(title.text_contents().trim(), self.options);

        for node in title.following_siblings() {
            if node.as_element().is_none() {
                continue;
            }

            match ElementType::of(&node) {
                ElementType::QuizTitle => break,
                ElementType::QuizType => ctx.record_quiz_type(&node.text_contents())?,
                ElementType::QuizSection(token) => ctx.enter_section(&token)?,
                ElementType::QuestionStem => ctx.start_question(&inner_markup(&node))?,
                ElementType::QuestionOption => ctx.add_option(&inner_markup(&node))?,
                ElementType::QuestionRationale => ctx.add_rationale(&inner_markup(&node))?,
                other @ ElementType::Continued(_) => {
                    debug!("{} 忽略未合并的续写段落 {}", ctx, other.marker_name());
                }
                ElementType::Unclassified => {}
            }
        }

        ctx.finish()
    }
}

/// 便捷入口
pub fn parse_quizzes(doc: &Document, options: &ParseOptions) -> Result<Vec<Quiz>, StructureError> {
    QuizFlow::new(options).run(doc)
}

/// 诊断测验文档：恰好一个标题，三个分区且每个难度各出现一次
fn check_diagnostic_layout(top_level: &[NodeRef]) -> Result<(), StructureError> {
    let mut titles = 0;
    let mut tokens = Vec::new();
    for node in top_level {
        match ElementType::of(node) {
            ElementType::QuizTitle => titles += 1,
            ElementType::QuizSection(token) => tokens.push(token),
            _ => {}
        }
    }

    let mut levels = tokens
        .iter()
        .map(|token| DifficultyLevel::from_token(token))
        .collect::<Result<Vec<_>, _>>()?;
    levels.sort();

    if titles != 1 || levels != DifficultyLevel::all() {
        return Err(StructureError::DiagnosticLayout {
            titles,
            sections: tokens,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::normalizer::normalize;
    use pretty_assertions::assert_eq;

    fn parse(markup: &str, options: &ParseOptions) -> Result<Vec<Quiz>, StructureError> {
        let mut doc = Document::parse(markup).unwrap();
        normalize(&mut doc).unwrap();
        parse_quizzes(&doc, options)
    }

    const STANDARD: &str = r#"
<p data-custom-style="QuizTitle">Ownership Basics</p>
<p data-custom-style="QuizType">Lesson</p>
<div data-custom-style="QuestionStem"><p>1. Who owns a value?</p></div>
<div data-custom-style="QuestionOption"><p>A. The caller</p></div>
<div data-custom-style="QuestionRationale"><p>No.</p></div>
<div data-custom-style="QuestionOption"><p>B. Exactly one binding [Correct]</p></div>
<div data-custom-style="QuestionRationale"><p>Yes.</p></div>
<div data-custom-style="QuestionStem"><p>2. Pick the copies</p></div>
<div data-custom-style="QuestionOption"><p>A. i32 [Correct]</p></div>
<div data-custom-style="QuestionRationale"><p>Copy.</p></div>
<div data-custom-style="QuestionOption"><p>B. String</p></div>
<div data-custom-style="QuestionRationale"><p>Move.</p></div>
<div data-custom-style="QuestionOption"><p>C. bool [Correct]</p></div>
<div data-custom-style="QuestionRationale"><p>Copy.</p></div>
<p data-custom-style="QuizTitle">Borrowing</p>
<div data-custom-style="QuestionStem"><p>Can you alias a &amp;mut?</p></div>
<div data-custom-style="QuestionOption"><p>Yes</p></div>
<div data-custom-style="QuestionRationale"><p>No.</p></div>
<div data-custom-style="QuestionOption"><p>No [Correct]</p></div>
<div data-custom-style="QuestionRationale"><p>Right.</p></div>
"#;

    #[test]
    fn splits_document_into_quizzes() {
        let quizzes = parse(STANDARD, &ParseOptions::default()).unwrap();
        assert_eq!(quizzes.len(), 2);

        let first = &quizzes[0];
        assert_eq!(first.title, "Ownership Basics");
        assert_eq!(first.module_type(), Some("Lesson"));
        assert_eq!(first.questions.len(), 2);
        assert_eq!(first.questions[0].stem, "<p>Who owns a value?</p>");
        assert_eq!(first.questions[0].correct_options, vec!["1"]);
        assert_eq!(first.questions[1].correct_options, vec!["0", "2"]);
        assert!(first.questions[1].multiple_responses());
        assert_eq!(first.questions[1].rationales.len(), 3);

        let second = &quizzes[1];
        assert_eq!(second.title, "Borrowing");
        assert_eq!(second.module_type(), None);
        assert_eq!(second.questions.len(), 1);
        // 两个选项默认不打乱
        assert!(!second.questions[0].shuffle_options);
    }

    #[test]
    fn continuation_is_merged_before_parsing() {
        let markup = r#"
<p data-custom-style="QuizTitle">Q</p>
<div data-custom-style="QuestionStem"><p>Look at this:</p></div>
<div data-custom-style="QuestionStemContinued"><p>more stem</p></div>
<div data-custom-style="QuestionOption"><p>a [Correct]</p></div>
"#;
        let options = ParseOptions {
            has_rationales: false,
            ..ParseOptions::default()
        };
        let quizzes = parse(markup, &options).unwrap();
        assert_eq!(
            quizzes[0].questions[0].stem,
            "<p>Look at this:</p><p>more stem</p>"
        );
    }

    #[test]
    fn missing_correct_flag_names_the_stem() {
        let markup = r#"
<p data-custom-style="QuizTitle">Q</p>
<div data-custom-style="QuestionStem"><p>Nothing is right</p></div>
<div data-custom-style="QuestionOption"><p>a</p></div>
<div data-custom-style="QuestionRationale"><p>r</p></div>
"#;
        assert_eq!(
            parse(markup, &ParseOptions::default()).unwrap_err(),
            StructureError::MissingCorrectFlag {
                stem: "<p>Nothing is right</p>".to_string()
            }
        );
    }

    #[test]
    fn rationales_ignored_when_disabled() {
        let options = ParseOptions {
            has_rationales: false,
            ..ParseOptions::default()
        };
        let quizzes = parse(STANDARD, &options).unwrap();
        assert!(quizzes[0].questions.iter().all(|q| q.rationales.is_empty()));
        assert_eq!(quizzes[0].questions[0].question_json()["data"]["metadata"], serde_json::json!({}));
    }

    const DIAGNOSTIC: &str = r#"
<p data-custom-style="QuizTitle">Async Rust</p>
<p data-custom-style="QuizSection Beginner">Beginner</p>
<div data-custom-style="QuestionStem"><p>What does .await do?</p></div>
<div data-custom-style="QuestionOption"><p>Yields [Correct]</p></div>
<div data-custom-style="QuestionOption"><p>Blocks</p></div>
<p data-custom-style="QuizSection Intermediate">Intermediate</p>
<div data-custom-style="QuestionStem"><p>Pin?</p></div>
<div data-custom-style="QuestionOption"><p>Fixed address [Correct]</p></div>
<p data-custom-style="QuizSection Advanced">Advanced</p>
<div data-custom-style="QuestionStem"><p>Waker?</p></div>
<div data-custom-style="QuestionOption"><p>Notifies executor [Correct]</p></div>
"#;

    #[test]
    fn diagnostic_sections_set_difficulty() {
        let quizzes = parse(DIAGNOSTIC, &ParseOptions::diagnostic()).unwrap();
        assert_eq!(quizzes.len(), 1);
        let levels: Vec<_> = quizzes[0]
            .questions
            .iter()
            .map(|q| q.difficulty().unwrap())
            .collect();
        assert_eq!(
            levels,
            vec![
                DifficultyLevel::Beginner,
                DifficultyLevel::Intermediate,
                DifficultyLevel::Advanced
            ]
        );
        assert_eq!(quizzes[0].questions[2].tags.values("Subject").unwrap(), ["async-rust"]);
        assert_eq!(quizzes[0].questions[0].tags.values("Level").unwrap(), ["1"]);
    }

    #[test]
    fn diagnostic_rationales_reach_metadata() {
        let markup = DIAGNOSTIC.replace(
            r#"<div data-custom-style="QuestionOption"><p>Yields [Correct]</p></div>"#,
            r#"<div data-custom-style="QuestionOption"><p>Yields [Correct]</p></div>
<div data-custom-style="QuestionRationale"><p>It suspends.</p></div>"#,
        );
        let quizzes = parse(&markup, &ParseOptions::diagnostic()).unwrap();
        let first = &quizzes[0].questions[0];
        assert_eq!(first.rationales, vec!["<p>It suspends.</p>"]);
        assert_eq!(
            first.question_json()["data"]["metadata"],
            serde_json::json!({"distractor_rationale_response_level": ["<p>It suspends.</p>"]})
        );
    }

    #[test]
    fn diagnostic_with_two_sections_is_rejected() {
        let markup = DIAGNOSTIC.replace(
            r#"<p data-custom-style="QuizSection Advanced">Advanced</p>"#,
            "",
        );
        assert!(matches!(
            parse(&markup, &ParseOptions::diagnostic()),
            Err(StructureError::DiagnosticLayout { titles: 1, .. })
        ));
    }

    #[test]
    fn diagnostic_with_unknown_level_is_rejected() {
        let markup = DIAGNOSTIC.replace("QuizSection Advanced", "QuizSection Expert");
        assert_eq!(
            parse(&markup, &ParseOptions::diagnostic()).unwrap_err(),
            StructureError::InvalidDifficulty {
                token: "Expert".to_string()
            }
        );
    }

    #[test]
    fn section_in_standard_quiz_is_rejected() {
        let markup = DIAGNOSTIC;
        assert!(matches!(
            parse(markup, &ParseOptions::default()),
            Err(StructureError::SectionInStandard { .. })
        ));
    }

    #[test]
    fn nodes_before_first_title_are_ignored() {
        let markup = format!("<p>Front matter</p>{}", STANDARD);
        let quizzes = parse(&markup, &ParseOptions::default()).unwrap();
        assert_eq!(quizzes.len(), 2);
    }
}
