use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 每行一个 ID，去掉首尾空白并忽略空行
pub fn parse_ids(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// 从文本文件读取 activity / item 的 ref ID 列表
pub async fn load_ids_file(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        anyhow::bail!("文件不存在: {}", path.display());
    }

    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取 ID 文件: {}", path.display()))?;

    let ids = parse_ids(&content);
    if ids.is_empty() {
        tracing::warn!("ID 文件为空: {}", path.display());
    } else {
        tracing::info!("成功加载 {} 个 ID", ids.len());
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_drops_blank_lines() {
        let ids = parse_ids("  a-1 \n\n\tb-2\r\n   \nc-3");
        assert_eq!(ids, vec!["a-1", "b-2", "c-3"]);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_ids_file(&dir.path().join("nope.txt")).await.unwrap_err();
        assert!(err.to_string().contains("文件不存在"));
    }
}
