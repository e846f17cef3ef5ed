use crate::error::{AppError, AppResult, ConfigError, FileError};
use crate::models::QuizKind;
use serde::Deserialize;
use std::path::Path;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 题库 Data API 配置 ---
    pub item_bank_base_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub domain: String,
    pub user_id: String,
    /// pandoc 可执行文件
    pub pandoc_path: String,
    /// 每次提交的记录数量
    pub batch_size: usize,
    /// 生成唯一 ID 的最大尝试次数
    pub id_retry_limit: usize,
    /// 是否去掉 <mark> 标签
    pub strip_marks: bool,
    /// 两个选项的题目（如判断题）是否打乱选项
    pub shuffle_two_option_questions: bool,
    /// 是否允许标准测验选择"无解析"
    pub allow_rationale_toggle: bool,
    /// 是否启用诊断测验导入
    pub enable_diagnostic: bool,
    pub publisher: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            item_bank_base_url: "https://data.learnosity.com/v2023.1.LTS".to_string(),
            consumer_key: String::new(),
            consumer_secret: String::new(),
            domain: "localhost".to_string(),
            user_id: String::new(),
            pandoc_path: "pandoc".to_string(),
            batch_size: 50,
            id_retry_limit: 5,
            strip_marks: true,
            shuffle_two_option_questions: false,
            allow_rationale_toggle: true,
            enable_diagnostic: false,
            publisher: "O'Reilly Media".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 先读取 TOML 配置文件，再用环境变量覆盖
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
                toml::from_str::<Config>(&content).map_err(|e| {
                    AppError::File(FileError::ParseFailed {
                        path: path.display().to_string(),
                        source: Box::new(e),
                    })
                })?
            }
            None => Self::default(),
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(self) -> Self {
        let default = self;
        Self {
            item_bank_base_url: std::env::var("ITEM_BANK_BASE_URL").unwrap_or(default.item_bank_base_url),
            consumer_key: std::env::var("CONSUMER_KEY").unwrap_or(default.consumer_key),
            consumer_secret: std::env::var("CONSUMER_SECRET").unwrap_or(default.consumer_secret),
            domain: std::env::var("ITEM_BANK_DOMAIN").unwrap_or(default.domain),
            user_id: std::env::var("ITEM_BANK_USER_ID").unwrap_or(default.user_id),
            pandoc_path: std::env::var("PANDOC_PATH").unwrap_or(default.pandoc_path),
            batch_size: std::env::var("BATCH_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.batch_size),
            id_retry_limit: std::env::var("ID_RETRY_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.id_retry_limit),
            strip_marks: std::env::var("STRIP_MARKS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.strip_marks),
            shuffle_two_option_questions: std::env::var("SHUFFLE_TWO_OPTION_QUESTIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.shuffle_two_option_questions),
            allow_rationale_toggle: std::env::var("ALLOW_RATIONALE_TOGGLE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.allow_rationale_toggle),
            enable_diagnostic: std::env::var("ENABLE_DIAGNOSTIC").ok().and_then(|v| v.parse().ok()).unwrap_or(default.enable_diagnostic),
            publisher: std::env::var("PUBLISHER").unwrap_or(default.publisher),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    fn validate(&self) -> AppResult<()> {
        if self.batch_size == 0 {
            return Err(AppError::Config(ConfigError::InvalidValue {
                name: "batch_size".to_string(),
                value: "0".to_string(),
            }));
        }
        if self.id_retry_limit == 0 {
            return Err(AppError::Config(ConfigError::InvalidValue {
                name: "id_retry_limit".to_string(),
                value: "0".to_string(),
            }));
        }
        Ok(())
    }

    /// 根据命令行参数构建解析配置
    pub fn parse_options(&self, quiz_kind: QuizKind, has_rationales: bool) -> AppResult<ParseOptions> {
        if quiz_kind == QuizKind::Diagnostic && !self.enable_diagnostic {
            return Err(AppError::Config(ConfigError::FeatureDisabled {
                feature: "diagnostic quizzes (ENABLE_DIAGNOSTIC)".to_string(),
            }));
        }

        // 不允许切换时，标准测验始终带解析
        let has_rationales = has_rationales || !self.allow_rationale_toggle;

        Ok(ParseOptions {
            quiz_kind,
            has_rationales,
            strip_marks: self.strip_marks,
            shuffle_two_option_questions: self.shuffle_two_option_questions,
            publisher: self.publisher.clone(),
        })
    }
}

/// 解析器配置（解析期间只读）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    pub quiz_kind: QuizKind,
    pub has_rationales: bool,
    pub strip_marks: bool,
    pub shuffle_two_option_questions: bool,
    pub publisher: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            quiz_kind: QuizKind::Standard,
            has_rationales: true,
            strip_marks: true,
            shuffle_two_option_questions: false,
            publisher: "O'Reilly Media".to_string(),
        }
    }
}

impl ParseOptions {
    pub fn diagnostic() -> Self {
        Self {
            quiz_kind: QuizKind::Diagnostic,
            has_rationales: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn diagnostic_requires_feature_flag() {
        let config = Config::default();
        let err = config.parse_options(QuizKind::Diagnostic, false).unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::FeatureDisabled { .. })));

        let config = Config {
            enable_diagnostic: true,
            ..Config::default()
        };
        let options = config.parse_options(QuizKind::Diagnostic, false).unwrap();
        assert_eq!(options.quiz_kind, QuizKind::Diagnostic);
    }

    #[test]
    fn rationales_forced_on_when_toggle_disallowed() {
        let config = Config {
            allow_rationale_toggle: false,
            ..Config::default()
        };
        let options = config.parse_options(QuizKind::Standard, false).unwrap();
        assert!(options.has_rationales);

        let options = Config::default().parse_options(QuizKind::Standard, false).unwrap();
        assert!(!options.has_rationales);
    }

    #[test]
    fn loads_partial_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "batch_size = 10\npublisher = \"Test Press\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.pandoc_path, "pandoc");
        assert_eq!(config.id_retry_limit, 5);
        if std::env::var("BATCH_SIZE").is_err() {
            assert_eq!(config.batch_size, 10);
        }
        if std::env::var("PUBLISHER").is_err() {
            assert_eq!(config.publisher, "Test Press");
        }
    }
}
