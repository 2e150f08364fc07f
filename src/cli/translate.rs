// ============================================================================
// Lara - 翻译命令处理
// ============================================================================
//
// 文件: src/cli/translate.rs
// 职责: 加载配置，组装翻译引擎并输出运行结果
// 边界:
//   - ✅ 翻译命令参数解析
//   - ✅ 账本、翻译服务、进度条的组装
//   - ✅ 致命错误的修复提示和失败时的非零退出
//   - ❌ 不应包含键级翻译决策
//   - ❌ 不应包含格式解析逻辑
//
// ============================================================================

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::Path;

use crate::core::checksum::{ChecksumTracker, FileLedgerStore};
use crate::core::engine::{EngineOptions, TranslationEngine};
use crate::core::provider::build_provider;
use crate::models::config::{ProjectConfig, RuntimeArgs, LEDGER_FILE_NAME};
use crate::ui::progress::TranslateProgress;
use crate::ui::summary::{print_failures, render_run_summary};
use crate::utils::logger::Logger;
use crate::{t, tf};

/// 翻译命令参数
#[derive(Debug, Args)]
pub struct TranslateArgs {
    /// 忽略已有译文，重新翻译所有键
    #[arg(short, long)]
    pub force: bool,

    /// 只翻译这些目标语言，逗号分隔
    #[arg(long, value_delimiter = ',')]
    pub locales: Vec<String>,

    /// 只处理这些路径，逗号分隔
    #[arg(short, long, value_delimiter = ',')]
    pub paths: Vec<String>,
}

/// 处理翻译命令
pub async fn handle_translate(args: TranslateArgs, runtime: &RuntimeArgs) -> Result<()> {
    let config_path = runtime.config_file();
    if !config_path.exists() {
        bail!(tf!("translate.no_config", config_path.display()));
    }
    let config = ProjectConfig::load(&config_path)
        .with_context(|| tf!("translate.config_error", config_path.display()))?;

    for locale in &args.locales {
        if !config.locales.target.contains(locale) {
            Logger::warn(tf!("translate.unknown_locale", locale));
        }
    }

    let root = runtime.project_root();
    let ledger_path = config_path.parent().unwrap_or(Path::new(".")).join(LEDGER_FILE_NAME);
    let tracker = ChecksumTracker::new(FileLedgerStore::new(&ledger_path)).with_base_dir(&root);
    let provider = build_provider(&config.provider).context(t!("translate.provider_error"))?;
    let api_key_env = config.provider.api_key_env.clone();

    Logger::info(tf!(
        "translate.start",
        config.locales.source,
        config.locales.target.join(", ")
    ));

    let options = EngineOptions {
        force: args.force,
        locales: args.locales,
        paths: args.paths,
    };
    let mut engine = TranslationEngine::new(config, &root, tracker, provider)
        .with_options(options)
        .with_progress(TranslateProgress::new(runtime.show_progress));

    let report = match engine.run().await {
        Ok(report) => report,
        Err(e) if e.is_fatal() => {
            Logger::error(tf!("translate.fatal", e));
            Logger::info(tf!("translate.fatal_hint", api_key_env));
            bail!(t!("translate.aborted"));
        }
        Err(e) => return Err(e.into()),
    };

    print_failures(&report);
    render_run_summary(&report);

    let failed = report.failures().count();
    if failed > 0 {
        bail!(tf!("translate.failed", failed));
    }
    Logger::success(t!("translate.done"));
    Ok(())
}
