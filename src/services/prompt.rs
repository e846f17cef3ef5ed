//! 命令行确认

use anyhow::{Context, Result};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

/// 回答是否表示继续
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// 在终端询问是否继续，默认否
pub async fn confirm(message: &str) -> Result<bool> {
    let mut stdout = io::stdout();
    stdout
        .write_all(format!("{} [y/N] ", message).as_bytes())
        .await
        .context("无法写入标准输出")?;
    stdout.flush().await.context("无法写入标准输出")?;

    let mut line = String::new();
    BufReader::new(io::stdin())
        .read_line(&mut line)
        .await
        .context("无法读取用户输入")?;

    Ok(is_affirmative(&line))
}
