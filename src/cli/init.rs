// ============================================================================
// Lara - 初始化命令处理
// ============================================================================
//
// 文件: src/cli/init.rs
// 职责: 扫描项目并生成 lara.yaml
// 边界:
//   - ✅ 初始化命令参数解析
//   - ✅ 语言和翻译文件发现结果写入配置
//   - ✅ 配置文件存在性检查
//   - ❌ 不应包含配置文件格式定义
//   - ❌ 不应包含文件系统扫描细节
//
// ============================================================================

use anyhow::{bail, Context, Result};
use clap::Args;
use indexmap::IndexMap;

use crate::models::config::{FileTypeConfig, ProjectConfig, RuntimeArgs};
use crate::utils::locale::{discover_include_paths, discover_locales};
use crate::utils::logger::Logger;
use crate::{t, tf};

/// 初始化命令参数
#[derive(Debug, Args)]
pub struct InitArgs {
    /// 源语言（默认 en 或发现的第一个语言）
    #[arg(short, long)]
    pub source: Option<String>,

    /// 目标语言，逗号分隔（默认为发现的其余语言）
    #[arg(short, long, value_delimiter = ',')]
    pub targets: Vec<String>,

    /// 强制覆盖已存在的配置文件
    #[arg(short, long)]
    pub force: bool,
}

/// 处理初始化命令
pub fn handle_init(args: InitArgs, runtime: &RuntimeArgs) -> Result<()> {
    Logger::info(t!("init.start"));

    let config_path = runtime.config_file();
    if config_path.exists() && !args.force {
        Logger::warn(tf!("init.config_exists", config_path.display()));
        Logger::info(t!("init.use_force_hint"));
        return Ok(());
    }

    let root = runtime.project_root();
    let discovered = discover_locales(&root);
    if !discovered.is_empty() {
        Logger::info(tf!("init.found_locales", discovered.join(", ")));
    }

    let source = args.source.unwrap_or_else(|| {
        if discovered.iter().any(|l| l == "en") || discovered.is_empty() {
            "en".to_string()
        } else {
            discovered[0].clone()
        }
    });
    let targets: Vec<String> = if args.targets.is_empty() {
        discovered.into_iter().filter(|l| *l != source).collect()
    } else {
        args.targets
    };
    if targets.is_empty() {
        bail!(t!("init.no_targets"));
    }

    let mut files = IndexMap::new();
    for (file_type, include) in discover_include_paths(&root, &source) {
        Logger::info(tf!("init.found_files", file_type, include.join(", ")));
        files.insert(
            file_type,
            FileTypeConfig {
                include,
                ..Default::default()
            },
        );
    }
    if files.is_empty() {
        Logger::warn(tf!("init.no_files", source));
    }

    let config = ProjectConfig::generate_default_template(&source, targets, files);
    config
        .validate()
        .with_context(|| t!("init.invalid_config"))?;
    if let Err(e) = config.save_to_file(&config_path) {
        Logger::error(tf!("init.create_failed", e));
        return Err(e.into());
    }

    Logger::success(tf!("init.config_created", config_path.display()));
    Logger::info(t!("init.next_steps"));
    Ok(())
}
