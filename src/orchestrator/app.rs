//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 持有配置和外部协作方（题库 API、文档转换器），把命令行子命令映射到完整流程：
//!
//! 1. **导入**：转换 → 解析 → 审阅文件 → 确认 → 提交 → 追加 ref-ids.txt
//! 2. **追加标签**：读取 ID / 标签文件 → 审阅文件 → 确认 → 更新 item 标签
//! 3. **归档**：读取 ID 文件 → 审阅文件 → 确认 → 归档 activity 和 item

use super::document_processor::process_markup;
use super::maintenance::{apply_archive, apply_tag_append, plan_archive, plan_tag_append, ArchiveStats};
use super::submission::{SubmissionStats, Submitter};
use crate::clients::{ConvertOptions, DocumentConverter, ItemBankApi, ItemBankClient, PandocConverter};
use crate::config::{Config, ParseOptions};
use crate::models::{load_ids_file, load_tags_file, QuizKind, TagSet};
use crate::services::{prompt, TranscriptWriter};
use crate::utils::logging::{log_quiz_summary, log_startup, print_final_stats};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// 导入参数（来自命令行）
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub docx: PathBuf,
    pub quiz_kind: QuizKind,
    pub question_bank_id: String,
    pub course_id: String,
    pub has_rationales: bool,
    pub tags_file: Option<PathBuf>,
}

/// 需要人工确认的任务的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    /// 用户在确认环节选择了不继续
    Cancelled,
}

/// 应用主结构
pub struct App {
    config: Config,
    api: Box<dyn ItemBankApi>,
    converter: Box<dyn DocumentConverter>,
    assume_yes: bool,
}

impl App {
    pub fn new(config: Config, assume_yes: bool) -> Self {
        let api = Box::new(ItemBankClient::new(&config));
        let converter = Box::new(PandocConverter::new(config.pandoc_path.clone()));
        Self::with_collaborators(config, api, converter, assume_yes)
    }

    pub fn with_collaborators(
        config: Config,
        api: Box<dyn ItemBankApi>,
        converter: Box<dyn DocumentConverter>,
        assume_yes: bool,
    ) -> Self {
        Self {
            config,
            api,
            converter,
            assume_yes,
        }
    }

    /// 导入 docx 中的测验
    pub async fn run_import(&self, request: &ImportRequest) -> Result<Outcome<SubmissionStats>> {
        log_startup("导入测验");

        let options = self
            .config
            .parse_options(request.quiz_kind, request.has_rationales)?;
        let extra_tags = match &request.tags_file {
            Some(path) => Some(load_tags_file(path).await?),
            None => None,
        };

        let media_dir = std::env::temp_dir().join(format!("docx-quiz-import-{}", Uuid::new_v4()));
        let result = self
            .import_with_media(request, &options, extra_tags.as_ref(), &media_dir)
            .await;

        if media_dir.exists() {
            if let Err(e) = tokio::fs::remove_dir_all(&media_dir).await {
                warn!("⚠️ 无法删除临时目录 {}: {}", media_dir.display(), e);
            }
        }
        result
    }

    async fn import_with_media(
        &self,
        request: &ImportRequest,
        options: &ParseOptions,
        extra_tags: Option<&TagSet>,
        media_dir: &Path,
    ) -> Result<Outcome<SubmissionStats>> {
        info!("📄 转换文档: {}", request.docx.display());
        let convert_options = ConvertOptions {
            extract_media_dir: Some(media_dir.to_path_buf()),
        };
        let markup = self
            .converter
            .convert(&request.docx, &convert_options)
            .await
            .with_context(|| format!("无法转换文档: {}", request.docx.display()))?;

        let writer = TranscriptWriter::beside(&request.docx);
        let processed = process_markup(
            self.api.as_ref(),
            &markup,
            options,
            Some(writer.dir()),
            self.config.id_retry_limit,
        )
        .await
        .with_context(|| format!("无法解析文档: {}", request.docx.display()))?;

        let mut quizzes = processed.quizzes;
        for quiz in &mut quizzes {
            quiz.apply_identifiers(&request.question_bank_id, &request.course_id);
            if let Some(tags) = extra_tags {
                quiz.apply_supplementary_tags(tags);
            }
        }
        log_quiz_summary(&quizzes);

        let review = writer.write_review(&quizzes).await?;
        let message = format!(
            "请检查 {} 中的测验详情，是否继续创建测验？",
            review.display()
        );
        if !self.confirm(&message).await? {
            info!("已取消，未提交任何内容");
            return Ok(Outcome::Cancelled);
        }

        let stats = Submitter::new(self.api.as_ref(), &self.config)
            .submit_all(&mut quizzes)
            .await
            .context("提交到题库失败")?;

        let transcript = writer.append_ref_ids(&quizzes).await?;
        print_final_stats(
            stats.quizzes,
            stats.questions,
            &transcript.display().to_string(),
        );
        Ok(Outcome::Completed(stats))
    }

    /// 给 activity 中的全部 item 追加标签
    pub async fn run_append_tags(&self, ids_file: &Path, tags_file: &Path) -> Result<Outcome<usize>> {
        log_startup("追加 item 标签");

        let activity_refs = load_ids_file(ids_file).await?;
        let tags = load_tags_file(tags_file).await?;
        let plan = plan_tag_append(self.api.as_ref(), &activity_refs, tags).await?;

        let writer = TranscriptWriter::beside(ids_file);
        let review = writer.write_timestamped_review(&plan.review_text()).await?;
        if !self
            .confirm(&format!("请检查 {} 后确认是否继续", review.display()))
            .await?
        {
            info!("已取消，未修改任何 item");
            return Ok(Outcome::Cancelled);
        }

        let updated = apply_tag_append(self.api.as_ref(), &plan, self.config.batch_size)
            .await
            .context("追加标签失败")?;
        Ok(Outcome::Completed(updated))
    }

    /// 归档 activity 及其独占的 item
    pub async fn run_archive(&self, ids_file: &Path) -> Result<Outcome<ArchiveStats>> {
        log_startup("归档 activity 和 item");

        let activity_refs = load_ids_file(ids_file).await?;
        let plan = plan_archive(self.api.as_ref(), &activity_refs).await?;
        if !plan.skipped.is_empty() {
            warn!("⚠️ {} 个 item 被其他 activity 使用，不会归档", plan.skipped.len());
        }

        let writer = TranscriptWriter::beside(ids_file);
        let review = writer.write_timestamped_review(&plan.review_text()).await?;
        if !self
            .confirm(&format!("请检查 {} 后确认是否继续", review.display()))
            .await?
        {
            info!("已取消，未归档任何内容");
            return Ok(Outcome::Cancelled);
        }

        let stats = apply_archive(self.api.as_ref(), &plan, self.config.batch_size)
            .await
            .context("归档失败")?;
        Ok(Outcome::Completed(stats))
    }

    async fn confirm(&self, message: &str) -> Result<bool> {
        if self.assume_yes {
            info!("--yes: 跳过确认");
            return Ok(true);
        }
        prompt::confirm(message).await
    }
}
