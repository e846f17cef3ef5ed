//! # Docx Quiz Import
//!
//! 把 Word 文档中按段落样式标注的测验导入在线题库的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 标记文档树，所有阶段都在同一棵树上原地修改
//! - `Document` - kuchiki 解析出的 DOM，只持有 `<body>`
//! - `document` - 属性读写、节点移动、序列化等辅助函数
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个服务只负责一种变换
//! - `normalizer` - 去噪、过滤属性、移动表格、合并续写段落
//! - `inline_code` - 代码样式转为 `<pre>` / `<code>`
//! - `cleanup` - 题干、选项、解析的文本清理
//! - `AssetService` - 图片上传与地址替换
//! - `IdAllocator` - 唯一 ref ID 分配
//! - `TranscriptWriter` - 审阅文件与 ref ID 记录
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一份文档"如何变成测验列表
//! - `ParseCtx` - 解析状态（当前测验、当前题目）
//! - `QuizFlow` - 按兄弟节点顺序驱动状态机
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 命令入口，持有配置和外部协作方
//! - `orchestrator/submission` - 分配 ID 并分块提交
//! - `orchestrator/maintenance` - 追加标签、归档
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, ParseOptions};
pub use error::{AppError, AppResult};
pub use infrastructure::Document;
pub use models::{Question, Quiz};
pub use orchestrator::{process_markup, App};
pub use workflow::{parse_quizzes, QuizFlow};
