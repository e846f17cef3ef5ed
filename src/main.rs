use anyhow::Result;
use clap::{Parser, Subcommand};
use docx_quiz_import::config::Config;
use docx_quiz_import::models::QuizKind;
use docx_quiz_import::orchestrator::{App, ImportRequest, Outcome};
use docx_quiz_import::utils::logging;
use std::path::PathBuf;
use tracing::info;

/// 把 docx 中的测验导入题库，以及维护已导入的内容
#[derive(Parser)]
#[command(name = "docx-quiz-import", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML 配置文件（环境变量优先）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 输出 debug 日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 解析 docx 并创建 questions / items / activities
    Import {
        /// 源文档
        docx: PathBuf,

        /// 测验类型: standard / diagnostic
        #[arg(long, value_enum, default_value = "standard")]
        quiz_type: QuizKind,

        /// 题库 ID（Question Bank FPID 标签）
        #[arg(long, default_value = "")]
        bank_id: String,

        /// 课程 ID（Course FPID 标签）
        #[arg(long, default_value = "")]
        course_id: String,

        /// 标准测验不包含选项解析
        #[arg(long)]
        no_rationales: bool,

        /// 补充标签 JSON 文件
        #[arg(long)]
        tags: Option<PathBuf>,

        /// 跳过确认
        #[arg(short, long)]
        yes: bool,
    },

    /// 给 activity 中的全部 item 追加标签
    AppendTags {
        /// activity ref ID 文件，每行一个
        ids: PathBuf,

        /// 标签 JSON 文件
        tags: PathBuf,

        /// 跳过确认
        #[arg(short, long)]
        yes: bool,
    },

    /// 归档 activity 及其 item
    Archive {
        /// activity ref ID 文件，每行一个
        ids: PathBuf,

        /// 跳过确认
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref())?;

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging);

    match cli.command {
        Commands::Import {
            docx,
            quiz_type,
            bank_id,
            course_id,
            no_rationales,
            tags,
            yes,
        } => {
            let request = ImportRequest {
                docx,
                quiz_kind: quiz_type,
                question_bank_id: bank_id,
                course_id,
                has_rationales: !no_rationales,
                tags_file: tags,
            };
            report(App::new(config, yes).run_import(&request).await?);
        }
        Commands::AppendTags { ids, tags, yes } => {
            report(App::new(config, yes).run_append_tags(&ids, &tags).await?);
        }
        Commands::Archive { ids, yes } => {
            report(App::new(config, yes).run_archive(&ids).await?);
        }
    }

    Ok(())
}

fn report<T: std::fmt::Debug>(outcome: Outcome<T>) {
    match outcome {
        Outcome::Completed(result) => info!("✅ 完成: {:?}", result),
        Outcome::Cancelled => info!("已退出"),
    }
}
