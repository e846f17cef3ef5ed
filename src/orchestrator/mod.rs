//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责把各层能力串成完整的命令，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 持有配置、题库 API 和文档转换器
//! - 每个命令行子命令对应一个 `run_*` 方法
//! - 写审阅文件并等待人工确认
//! - 管理临时媒体目录
//!
//! ### `document_processor` - 单个文档处理器
//! - HTML → 规整 → 行内代码 → 图片上传 → 测验列表
//!
//! ### `submission` - 批量提交
//! - 分配 ref ID，按 questions → items → activities 顺序分块提交
//!
//! ### `maintenance` - 题库维护
//! - 追加 item 标签、归档 activity 和 item
//!
//! ## 层次关系
//!
//! ```text
//! app (处理一条命令)
//!     ↓
//! document_processor / submission / maintenance
//!     ↓
//! workflow::QuizFlow (文档树 → 测验)
//!     ↓
//! services (能力层：normalizer / cleanup / assets / ids / transcripts)
//!     ↓
//! infrastructure (基础设施：Document)
//! ```

pub mod app;
pub mod document_processor;
pub mod maintenance;
pub mod submission;

// 重新导出主要类型
pub use app::{App, ImportRequest, Outcome};
pub use document_processor::{process_markup, ProcessedDocument};
pub use maintenance::{ArchivePlan, ArchiveStats, TagAppendPlan};
pub use submission::{get_entities, submit_chunked, SubmissionStats, Submitter};
