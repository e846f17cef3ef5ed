use super::question::{Question, QuestionVariant};
use super::tags::{TagSet, COURSE_FPID, PUBLISHER, QUESTION_BANK_FPID, QUIZ_TYPE};
use crate::error::StructureError;
use serde_json::{json, Value};
use clap::ValueEnum;
use std::fmt;

/// 解析时由调用方指定的测验类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum QuizKind {
    #[default]
    Standard,
    Diagnostic,
}

impl QuizKind {
    pub fn name(self) -> &'static str {
        match self {
            QuizKind::Standard => "Standard",
            QuizKind::Diagnostic => "Diagnostic",
        }
    }
}

impl fmt::Display for QuizKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizVariant {
    Standard { module_type: Option<String> },
    Diagnostic,
}

/// 一个测验（对应题库中的 activity）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    pub title: String,
    pub questions: Vec<Question>,
    pub tags: TagSet,
    pub ref_id: Option<String>,
    pub shuffle_items: bool,
    pub variant: QuizVariant,
}

impl Quiz {
    pub fn new(kind: QuizKind, title: impl Into<String>, publisher: &str) -> Self {
        let mut tags = TagSet::new();
        tags.set(PUBLISHER, publisher);
        tags.set(QUESTION_BANK_FPID, "");

        let variant = match kind {
            QuizKind::Standard => {
                tags.set(COURSE_FPID, "");
                QuizVariant::Standard { module_type: None }
            }
            QuizKind::Diagnostic => {
                tags.set(QUIZ_TYPE, QuizKind::Diagnostic.name());
                QuizVariant::Diagnostic
            }
        };

        Self {
            title: title.into(),
            questions: Vec::new(),
            tags,
            ref_id: None,
            shuffle_items: true,
            variant,
        }
    }

    pub fn kind(&self) -> QuizKind {
        match self.variant {
            QuizVariant::Standard { .. } => QuizKind::Standard,
            QuizVariant::Diagnostic => QuizKind::Diagnostic,
        }
    }

    pub fn module_type(&self) -> Option<&str> {
        match &self.variant {
            QuizVariant::Standard { module_type } => module_type.as_deref(),
            QuizVariant::Diagnostic => None,
        }
    }

    /// 记录 QuizType 标记，诊断测验中不允许出现
    pub fn set_module_type(&mut self, value: impl Into<String>) -> Result<(), StructureError> {
        match &mut self.variant {
            QuizVariant::Standard { module_type } => {
                let value = value.into();
                self.tags.set(QUIZ_TYPE, value.clone());
                *module_type = Some(value);
                Ok(())
            }
            QuizVariant::Diagnostic => Err(StructureError::QuizTypeInDiagnostic {
                quiz: self.title.clone(),
            }),
        }
    }

    /// 诊断题目的 Subject 标签值
    pub fn skill(&self) -> String {
        slugify(&self.title)
    }

    /// 审阅文件中显示的类型
    pub fn display_type(&self) -> &str {
        match &self.variant {
            QuizVariant::Standard { module_type } => module_type.as_deref().unwrap_or("undefined"),
            QuizVariant::Diagnostic => QuizKind::Diagnostic.name(),
        }
    }

    /// 填入题库 / 课程 ID 占位标签
    pub fn apply_identifiers(&mut self, question_bank_id: &str, course_id: &str) {
        self.tags.set(QUESTION_BANK_FPID, question_bank_id);
        if matches!(self.variant, QuizVariant::Standard { .. }) {
            self.tags.set(COURSE_FPID, course_id);
        }

        for question in &mut self.questions {
            match question.variant {
                QuestionVariant::Standard { .. } => question.tags.set(COURSE_FPID, course_id),
                QuestionVariant::Diagnostic { .. } => {
                    question.tags.set(QUESTION_BANK_FPID, question_bank_id)
                }
            }
        }
    }

    /// 把标签文件中的标签合并到测验及其全部题目（同名标签整体替换）
    pub fn apply_supplementary_tags(&mut self, extra: &TagSet) {
        self.tags.merge_replace(extra);
        for question in &mut self.questions {
            question.tags.merge_replace(extra);
        }
    }

    pub fn item_refs(&self) -> Vec<String> {
        self.questions
            .iter()
            .filter_map(|q| q.item_ref_id.clone())
            .collect()
    }

    /// 题库 `activities` 记录
    pub fn activity_json(&self) -> Value {
        json!({
            "title": self.title,
            "reference": self.ref_id.clone().unwrap_or_default(),
            "status": "published",
            "data": {
                "items": self.item_refs(),
                "config": {
                    "configuration": { "shuffle_items": self.shuffle_items },
                    "regions": "main"
                },
                "rendering_type": "assess"
            },
            "tags": self.tags,
        })
    }
}

/// 小写字母数字，其余字符折叠为单个 `-`
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
