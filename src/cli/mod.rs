// ============================================================================
// Lara - CLI 模块
// ============================================================================
//
// 文件: src/cli/mod.rs
// 职责: CLI 命令行接口模块入口和路由
// 边界:
//   - ✅ CLI 结构定义和命令枚举
//   - ✅ 全局参数合并为运行时参数
//   - ✅ 命令路由分发
//   - ❌ 不应包含具体命令实现逻辑
//   - ❌ 不应包含数据模型定义
//
// ============================================================================

pub mod init;
pub mod translate;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::i18n;
use crate::models::config::RuntimeArgs;
use crate::utils::colors::Colors;
use crate::utils::logger::Logger;
use init::{handle_init, InitArgs};
use translate::{handle_translate, TranslateArgs};

/// Lara - Incremental localization sync
#[derive(Debug, Parser)]
#[command(name = "lara")]
#[command(about = "Keep translation files in sync with a changing source locale")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Verbose diagnostics
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Interface language (zh_cn, en_us)
    #[arg(short, long, global = true)]
    pub language: Option<String>,

    /// Project root directory
    #[arg(short = 'C', long, global = true)]
    pub workspace_root: Option<String>,

    /// Config file path, relative to the project root
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Disable progress spinners
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Commands
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Discover locales and translation files, then write lara.yaml
    Init(InitArgs),
    /// Translate new and changed keys into every target locale
    Translate(TranslateArgs),
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let runtime_args = build_runtime_args(&cli);
    Logger::init(runtime_args.verbose);
    if let Some(language) = &runtime_args.language {
        i18n::set_language(language);
    }
    if cli.no_color {
        Colors::disable();
    }

    match cli.command {
        Commands::Init(args) => handle_init(args, &runtime_args),
        Commands::Translate(args) => handle_translate(args, &runtime_args).await,
    }
}

/// Build runtime args from CLI arguments
fn build_runtime_args(cli: &Cli) -> RuntimeArgs {
    RuntimeArgs {
        verbose: cli.verbose,
        show_progress: !cli.no_progress,
        workspace_root: cli.workspace_root.clone(),
        config_path: cli.config.clone(),
        language: cli.language.clone(),
    }
}
