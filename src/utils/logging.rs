/// 日志工具模块
///
/// 提供日志初始化以及格式化输出的辅助函数
use crate::models::Quiz;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则根据 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 测试中可能重复初始化，忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(command: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", command);
    info!(
        "启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
}

/// 记录解析结果摘要
pub fn log_quiz_summary(quizzes: &[Quiz]) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 共解析出 {} 个测验", quizzes.len());
    for (index, quiz) in quizzes.iter().enumerate() {
        info!(
            "  {}. {} ({} 道题)",
            index + 1,
            truncate_text(&quiz.title, 60),
            quiz.questions.len()
        );
    }
    info!("{}", "─".repeat(60));
}

/// 打印提交完成统计
pub fn print_final_stats(quizzes: usize, questions: usize, transcript: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 测验: {}", quizzes);
    info!("✅ 题目: {}", questions);
    info!("{}", "=".repeat(60));
    info!("\nID 记录已保存至: {}", transcript);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
