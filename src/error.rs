use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 文档结构不符合约定（作者需要修改源文档）
    #[error("文档结构错误: {0}")]
    Structure(#[from] StructureError),
    /// 标记解析错误
    #[error("标记解析错误: {0}")]
    Markup(#[from] MarkupError),
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 多次尝试后仍无法生成不冲突的 ID
    #[error("无法在 {attempts} 次尝试内生成唯一的 {namespace} ID")]
    IdentifiersExhausted { namespace: String, attempts: usize },
}

/// 文档结构错误
///
/// 每个变体都带有足够的上下文（通常是题干），方便作者定位源文档中的问题。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("诊断测验 \"{quiz}\" 中不允许出现 QuizType 标记")]
    QuizTypeInDiagnostic { quiz: String },

    #[error("标准测验 \"{quiz}\" 中不允许出现 QuizSection 标记 ({marker})")]
    SectionInStandard { quiz: String, marker: String },

    #[error("无效的难度等级 \"{token}\"，只允许 Beginner / Intermediate / Advanced")]
    InvalidDifficulty { token: String },

    #[error("诊断测验文档必须恰好包含 1 个 QuizTitle 和 3 个 QuizSection (Beginner/Intermediate/Advanced 各一次)，实际: {titles} 个标题, 分区 {sections:?}")]
    DiagnosticLayout { titles: usize, sections: Vec<String> },

    #[error("题目缺少正确答案标记: {stem}")]
    MissingCorrectFlag { stem: String },

    #[error("题目的选项数 ({options}) 与解析数 ({rationales}) 不一致: {stem}")]
    RationaleMismatch {
        stem: String,
        options: usize,
        rationales: usize,
    },

    #[error("{marker} 没有可以合并进去的前一个兄弟节点")]
    MissingPredecessor { marker: String },

    #[error("测验 \"{quiz}\" 中的 {marker} 出现在第一个题干之前")]
    OrphanElement { marker: String, quiz: String },

    #[error("诊断测验中的题目不在任何 QuizSection 之内: {stem}")]
    QuestionOutsideSection { stem: String },
}

/// 标记解析错误
#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("无效的 CSS 选择器: {selector}")]
    Selector { selector: String },

    #[error("解析结果中没有 <body> 节点")]
    MissingBody,
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// API 返回错误响应
    #[error("API返回错误响应 ({endpoint}): status={status:?}, message={message:?}")]
    BadResponse {
        endpoint: String,
        status: Option<u16>,
        message: Option<String>,
    },
    /// API 返回空结果
    #[error("API返回空结果: {endpoint}")]
    EmptyResponse { endpoint: String },
    /// JSON 解析失败
    #[error("JSON解析失败: {source}")]
    JsonParseFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("文件内容解析失败 ({path}): {source}")]
    ParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置项 {name} 的值 '{value}' 无效")]
    InvalidValue { name: String, value: String },
    #[error("功能未启用: {feature}")]
    FeatureDisabled { feature: String },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed {
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn api_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
