use super::tags::{TagSet, COURSE_FPID, LEVEL, PUBLISHER, QUESTION_BANK_FPID, SUBJECT};
use crate::config::ParseOptions;
use crate::error::StructureError;
use serde::Serialize;
use serde_json::{json, Value};

/// 选择题选项：`value` 是从 0 开始的位置下标
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct McqOption {
    pub label: String,
    pub value: String,
}

/// 诊断测验难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DifficultyLevel {
    Beginner = 1,
    Intermediate = 2,
    Advanced = 3,
}

impl DifficultyLevel {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            DifficultyLevel::Beginner => "Beginner",
            DifficultyLevel::Intermediate => "Intermediate",
            DifficultyLevel::Advanced => "Advanced",
        }
    }

    /// 解析 QuizSection 标记后面的等级文本（忽略大小写）
    pub fn from_token(token: &str) -> Result<Self, StructureError> {
        match token.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(DifficultyLevel::Beginner),
            "intermediate" => Ok(DifficultyLevel::Intermediate),
            "advanced" => Ok(DifficultyLevel::Advanced),
            _ => Err(StructureError::InvalidDifficulty {
                token: token.to_string(),
            }),
        }
    }

    pub fn all() -> [DifficultyLevel; 3] {
        [
            DifficultyLevel::Beginner,
            DifficultyLevel::Intermediate,
            DifficultyLevel::Advanced,
        ]
    }
}

/// 题目变体
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionVariant {
    Standard { has_rationales: bool },
    Diagnostic {
        difficulty: DifficultyLevel,
        skill: String,
    },
}

/// 解析期间累积的题目内容，闭合时交给 [`Question::assemble`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionParts {
    pub stem: String,
    pub options: Vec<McqOption>,
    pub correct_options: Vec<String>,
    pub rationales: Vec<String>,
}

/// 一道单选/多选题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub stem: String,
    pub options: Vec<McqOption>,
    pub correct_options: Vec<String>,
    pub rationales: Vec<String>,
    pub shuffle_options: bool,
    pub tags: TagSet,
    pub question_ref_id: Option<String>,
    pub item_ref_id: Option<String>,
    pub variant: QuestionVariant,
}

impl Question {
    /// 闭合一道题：校验正确答案标记和解析数量，并写入变体相关的标签
    pub fn assemble(
        parts: QuestionParts,
        variant: QuestionVariant,
        options: &ParseOptions,
    ) -> Result<Self, StructureError> {
        let QuestionParts {
            stem,
            options: mcq_options,
            correct_options,
            rationales,
        } = parts;

        if correct_options.is_empty() {
            return Err(StructureError::MissingCorrectFlag { stem });
        }

        let rationales = match &variant {
            QuestionVariant::Standard {
                has_rationales: true,
            } => {
                if mcq_options.len() != rationales.len() {
                    return Err(StructureError::RationaleMismatch {
                        stem,
                        options: mcq_options.len(),
                        rationales: rationales.len(),
                    });
                }
                rationales
            }
            // 不带解析的标准题忽略文档中的解析段落
            QuestionVariant::Standard {
                has_rationales: false,
            } => Vec::new(),
            // 诊断题的解析按原样保留，不要求与选项一一对应
            QuestionVariant::Diagnostic { .. } => rationales,
        };

        let shuffle_options = options.shuffle_two_option_questions || mcq_options.len() != 2;

        let mut tags = TagSet::new();
        tags.set(PUBLISHER, options.publisher.clone());
        match &variant {
            QuestionVariant::Standard { .. } => {
                tags.set(COURSE_FPID, "");
            }
            QuestionVariant::Diagnostic { difficulty, skill } => {
                tags.set(QUESTION_BANK_FPID, "");
                tags.set(LEVEL, difficulty.code().to_string());
                tags.set(SUBJECT, skill.clone());
            }
        }

        Ok(Self {
            stem,
            options: mcq_options,
            correct_options,
            rationales,
            shuffle_options,
            tags,
            question_ref_id: None,
            item_ref_id: None,
            variant,
        })
    }

    pub fn multiple_responses(&self) -> bool {
        self.correct_options.len() > 1
    }

    pub fn difficulty(&self) -> Option<DifficultyLevel> {
        match &self.variant {
            QuestionVariant::Diagnostic { difficulty, .. } => Some(*difficulty),
            QuestionVariant::Standard { .. } => None,
        }
    }

    /// 题库 `questions` 记录（mcq）
    pub fn question_json(&self) -> Value {
        let metadata = if self.rationales.is_empty() {
            json!({})
        } else {
            json!({ "distractor_rationale_response_level": self.rationales })
        };

        json!({
            "type": "mcq",
            "reference": self.question_ref_id.clone().unwrap_or_default(),
            "data": {
                "multiple_responses": self.multiple_responses(),
                "options": self.options,
                "stimulus": self.stem,
                "type": "mcq",
                "validation": {
                    "scoring_type": "exactMatch",
                    "valid_response": {
                        "score": 1,
                        "value": self.correct_options,
                    }
                },
                "ui_style": { "type": "horizontal" },
                "metadata": metadata,
                "shuffle_options": self.shuffle_options,
            }
        })
    }

    /// 题库 `items` 记录，每个 item 只包含一道题
    pub fn item_json(&self) -> Value {
        let question_ref = self.question_ref_id.clone().unwrap_or_default();
        json!({
            "reference": self.item_ref_id.clone().unwrap_or_default(),
            "metadata": null,
            "definition": {
                "widgets": [{ "reference": question_ref }]
            },
            "status": "published",
            "questions": [{ "reference": question_ref }],
            "tags": self.tags,
        })
    }
}
