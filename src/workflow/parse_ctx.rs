//! 测验解析上下文
//!
//! 封装"我正在解析哪个测验、哪道题"的全部可变状态。状态机的每一步都是
//! 这里的一个方法，不依赖文档树，可以单独测试。

use crate::config::ParseOptions;
use crate::error::StructureError;
use crate::models::{DifficultyLevel, McqOption, Question, QuestionParts, QuestionVariant, Quiz, QuizKind};
use crate::services::cleanup::{clean_fragment, has_correct_flag, FragmentKind};
use std::fmt::Display;
use tracing::{debug, warn};

/// 正在累积的题目
#[derive(Debug, Clone, Default)]
struct QuestionDraft {
    parts: QuestionParts,
    /// 题干出现时所在的难度分区
    difficulty: Option<DifficultyLevel>,
}

#[derive(Debug)]
pub struct ParseCtx<'a> {
    quiz: Quiz,
    options: &'a ParseOptions,
    draft: Option<QuestionDraft>,
    section: Option<DifficultyLevel>,
}

impl<'a> ParseCtx<'a> {
    pub fn new(title: impl Into<String>, options: &'a ParseOptions) -> Self {
        Self {
            quiz: Quiz::new(options.quiz_kind, title, &options.publisher),
            options,
            draft: None,
            section: None,
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    /// 已闭合的题目数
    pub fn question_count(&self) -> usize {
        self.quiz.questions.len()
    }

    /// QuizType 标记
    pub fn record_quiz_type(&mut self, text: &str) -> Result<(), StructureError> {
        self.quiz.set_module_type(text.trim())
    }

    /// QuizSection 标记：之后的题目属于该难度
    pub fn enter_section(&mut self, token: &str) -> Result<(), StructureError> {
        if self.quiz.kind() != QuizKind::Diagnostic {
            return Err(StructureError::SectionInStandard {
                quiz: self.quiz.title.clone(),
                marker: format!("QuizSection{}", token),
            });
        }
        let level = DifficultyLevel::from_token(token)?;
        debug!("{} 进入 {} 分区", self, level.name());
        self.section = Some(level);
        Ok(())
    }

    /// QuestionStem 标记：闭合上一题并开始新题
    pub fn start_question(&mut self, raw_stem: &str) -> Result<(), StructureError> {
        self.close_question()?;

        let stem = clean_fragment(raw_stem, FragmentKind::Stem, self.options.strip_marks);
        if self.quiz.kind() == QuizKind::Diagnostic && self.section.is_none() {
            return Err(StructureError::QuestionOutsideSection { stem });
        }

        self.draft = Some(QuestionDraft {
            parts: QuestionParts {
                stem,
                ..QuestionParts::default()
            },
            difficulty: self.section,
        });
        Ok(())
    }

    /// QuestionOption 标记：下标按出现顺序从 0 开始
    pub fn add_option(&mut self, raw_option: &str) -> Result<(), StructureError> {
        let strip_marks = self.options.strip_marks;
        let draft = self.draft_mut("QuestionOption")?;

        let index = draft.parts.options.len().to_string();
        if has_correct_flag(raw_option) {
            draft.parts.correct_options.push(index.clone());
        }
        draft.parts.options.push(McqOption {
            label: clean_fragment(raw_option, FragmentKind::Option, strip_marks),
            value: index,
        });
        Ok(())
    }

    /// QuestionRationale 标记：按出现顺序对应选项
    ///
    /// 关闭了解析的标准测验会忽略它；诊断测验总是保留。
    pub fn add_rationale(&mut self, raw_rationale: &str) -> Result<(), StructureError> {
        if !self.uses_rationales() {
            return Ok(());
        }
        let strip_marks = self.options.strip_marks;
        let draft = self.draft_mut("QuestionRationale")?;
        draft
            .parts
            .rationales
            .push(clean_fragment(raw_rationale, FragmentKind::Rationale, strip_marks));
        Ok(())
    }

    /// 闭合最后一道题并返回完整的测验
    pub fn finish(mut self) -> Result<Quiz, StructureError> {
        self.close_question()?;
        if self.quiz.questions.is_empty() {
            warn!("⚠️ 测验 \"{}\" 中没有任何题目", self.quiz.title);
        }
        Ok(self.quiz)
    }

    fn uses_rationales(&self) -> bool {
        self.quiz.kind() == QuizKind::Diagnostic || self.options.has_rationales
    }

    fn draft_mut(&mut self, marker: &str) -> Result<&mut QuestionDraft, StructureError> {
        match self.draft.as_mut() {
            Some(draft) => Ok(draft),
            None => Err(StructureError::OrphanElement {
                marker: marker.to_string(),
                quiz: self.quiz.title.clone(),
            }),
        }
    }

    fn close_question(&mut self) -> Result<(), StructureError> {
        let Some(draft) = self.draft.take() else {
            return Ok(());
        };

        let variant = match (self.quiz.kind(), draft.difficulty) {
            (QuizKind::Diagnostic, Some(difficulty)) => QuestionVariant::Diagnostic {
                difficulty,
                skill: self.quiz.skill(),
            },
            (QuizKind::Diagnostic, None) => {
                return Err(StructureError::QuestionOutsideSection {
                    stem: draft.parts.stem,
                })
            }
            (QuizKind::Standard, _) => QuestionVariant::Standard {
                has_rationales: self.options.has_rationales,
            },
        };

        let question = Question::assemble(draft.parts, variant, self.options)?;
        debug!(
            "{} 闭合题目: {} 个选项, 正确答案 {:?}",
            self,
            question.options.len(),
            question.correct_options
        );
        self.quiz.questions.push(question);
        Ok(())
    }
}

impl Display for ParseCtx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[测验 \"{}\" 题目#{}]",
            self.quiz.title,
            self.quiz.questions.len() + usize::from(self.draft.is_some())
        )
    }
}
