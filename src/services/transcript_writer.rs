//! 记录文件写入服务 - 业务能力层
//!
//! 审阅文件（提交前人工确认）和 ref ID 记录（提交后追加）都写在源文件所在目录。

use crate::error::{AppError, AppResult};
use crate::models::Quiz;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

pub const REVIEW_FILE: &str = "review-file.txt";
pub const REF_IDS_FILE: &str = "ref-ids.txt";

pub struct TranscriptWriter {
    dir: PathBuf,
}

impl TranscriptWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 以源文件所在目录创建
    pub fn beside(source: &Path) -> Self {
        let dir = source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 审阅文件内容：每个测验的标题、类型以及每道题的 JSON
    pub fn format_review(quizzes: &[Quiz]) -> String {
        let mut out = String::new();
        for (index, quiz) in quizzes.iter().enumerate() {
            out.push_str(&format!("Quiz {}:\n", index + 1));
            out.push_str(&format!("Title: {}\n", quiz.title));
            out.push_str(&format!("Type: {}\n", quiz.display_type()));
            for (i, question) in quiz.questions.iter().enumerate() {
                out.push_str(&format!("\tQuestion {}:\n", i + 1));
                out.push_str(&format!("\t{}\n", question.question_json()));
            }
            out.push('\n');
        }
        out
    }

    pub fn format_ref_ids(quizzes: &[Quiz]) -> String {
        let mut out = String::new();
        for quiz in quizzes {
            out.push_str(&format!(
                "Generated quiz with title \"{}\" and ref Id: {}\n",
                quiz.title,
                quiz.ref_id.as_deref().unwrap_or_default()
            ));
            out.push_str("Generated items with ref Ids:\n");
            for item in quiz.item_refs() {
                out.push_str(&item);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    /// 覆盖写入 `review-file.txt`
    pub async fn write_review(&self, quizzes: &[Quiz]) -> AppResult<PathBuf> {
        let path = self.dir.join(REVIEW_FILE);
        self.write_file(&path, &Self::format_review(quizzes)).await?;
        info!("测验详情已写入 {}", path.display());
        Ok(path)
    }

    /// 追加到 `ref-ids.txt`
    pub async fn append_ref_ids(&self, quizzes: &[Quiz]) -> AppResult<PathBuf> {
        let path = self.dir.join(REF_IDS_FILE);
        let content = Self::format_ref_ids(quizzes);
        debug!("追加 ref ID 记录: {} 个测验", quizzes.len());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

        info!("ref ID 已写入 {}", path.display());
        Ok(path)
    }

    /// 写入带时间戳的审阅文件 `review-file-<毫秒>.txt`
    pub async fn write_timestamped_review(&self, content: &str) -> AppResult<PathBuf> {
        let millis = chrono::Utc::now().timestamp_millis();
        let path = self.dir.join(format!("review-file-{}.txt", millis));
        self.write_file(&path, content).await?;
        info!("确认文件已写入 {}", path.display());
        Ok(path)
    }

    async fn write_file(&self, path: &Path, content: &str) -> AppResult<()> {
        fs::write(path, content)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))
    }
}
