// ============================================================================
// Lara - 中文翻译表
// ============================================================================
//
// 文件: src/i18n/zh_cn.rs
// 职责: 中文界面文本定义
// 边界:
//   - ✅ 中文翻译字符串定义
//   - ❌ 不应包含翻译逻辑
//   - ❌ 不应包含其他语言翻译
//
// ============================================================================

/// 中文翻译表
pub const TRANSLATIONS: &[(&str, &str)] = &[
    // 初始化命令
    ("init.start", "正在扫描项目中的翻译文件..."),
    ("init.config_exists", "配置文件已存在: {}"),
    ("init.use_force_hint", "使用 --force 覆盖已存在的配置文件"),
    ("init.found_locales", "发现语言: {}"),
    ("init.found_files", "发现 {} 文件: {}"),
    ("init.no_targets", "未发现目标语言，请使用 --targets it,fr 指定"),
    (
        "init.no_files",
        "未找到源语言 '{}' 的翻译文件，请手动在配置中添加 include 路径",
    ),
    ("init.invalid_config", "生成的配置无效"),
    ("init.create_failed", "写入配置文件失败: {}"),
    ("init.config_created", "已创建配置文件: {}"),
    (
        "init.next_steps",
        "下一步: 在配置中设置 provider.endpoint，导出 API 密钥后运行 `lara translate`",
    ),
    // 翻译命令
    ("translate.no_config", "未找到配置文件: {}（请先运行 `lara init`）"),
    ("translate.config_error", "加载配置文件失败: {}"),
    ("translate.unknown_locale", "语言 '{}' 不在配置的目标语言中"),
    ("translate.provider_error", "初始化翻译服务失败"),
    ("translate.start", "从 {} 翻译到 {}"),
    ("translate.file_error", "翻译 {} 出错: {}"),
    ("translate.fatal", "翻译服务错误: {}"),
    (
        "translate.fatal_hint",
        "请检查环境变量 {} 中的 API 密钥和服务地址后重新运行",
    ),
    ("translate.aborted", "翻译已中止"),
    ("translate.failed", "{} 个文件翻译失败"),
    ("translate.done", "所有文件均已同步"),
    // 汇总
    ("summary.title", "翻译汇总"),
    ("summary.files_written", "已写入文件: {}"),
    ("summary.files_unchanged", "未变化文件: {}"),
    ("summary.files_failed", "失败文件: {}"),
    ("summary.keys", "键: 翻译 {}，复制 {}，保留 {}，移除 {}"),
    ("summary.duration", "耗时: {}s"),
];
