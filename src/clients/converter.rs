use crate::error::{ApiError, AppError, AppResult, FileError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// 图片等嵌入资源的导出目录
    pub extract_media_dir: Option<PathBuf>,
}

/// docx → HTML 片段
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(&self, path: &Path, options: &ConvertOptions) -> AppResult<String>;
}

/// 调用外部 pandoc 进程
pub struct PandocConverter {
    program: String,
}

impl PandocConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(path: &Path, options: &ConvertOptions) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            "docx+styles".to_string(),
            "-t".to_string(),
            "html5".to_string(),
            "--wrap=none".to_string(),
        ];
        if let Some(dir) = &options.extract_media_dir {
            args.push(format!("--extract-media={}", dir.display()));
        }
        args.push(path.display().to_string());
        args
    }
}

#[async_trait]
impl DocumentConverter for PandocConverter {
    async fn convert(&self, path: &Path, options: &ConvertOptions) -> AppResult<String> {
        if !path.exists() {
            return Err(FileError::NotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let args = Self::args(path, options);
        debug!("运行 {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|e| AppError::api_request_failed(self.program.clone(), e))?;

        if !output.status.success() {
            return Err(ApiError::BadResponse {
                endpoint: self.program.clone(),
                status: output.status.code().and_then(|c| u16::try_from(c).ok()),
                message: Some(String::from_utf8_lossy(&output.stderr).trim().to_string()),
            }
            .into());
        }

        let markup = String::from_utf8_lossy(&output.stdout).into_owned();
        if markup.trim().is_empty() {
            return Err(ApiError::EmptyResponse {
                endpoint: self.program.clone(),
            }
            .into());
        }

        Ok(markup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_pandoc_arguments() {
        let options = ConvertOptions {
            extract_media_dir: Some(PathBuf::from("/tmp/media")),
        };
        let args = PandocConverter::args(Path::new("quiz.docx"), &options);
        assert_eq!(
            args,
            vec![
                "-f",
                "docx+styles",
                "-t",
                "html5",
                "--wrap=none",
                "--extract-media=/tmp/media",
                "quiz.docx"
            ]
        );
    }

    #[tokio::test]
    async fn missing_document_is_reported() {
        let converter = PandocConverter::new("pandoc");
        let err = converter
            .convert(Path::new("/definitely/missing.docx"), &ConvertOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::File(FileError::NotFound { .. })));
    }

    #[tokio::test]
    async fn missing_program_is_a_request_failure() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let converter = PandocConverter::new("pandoc-does-not-exist");
        let err = converter
            .convert(file.path(), &ConvertOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Api(ApiError::RequestFailed { .. })));
    }
}
