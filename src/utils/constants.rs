// ============================================================================
// Lara - 常量定义
// ============================================================================
//
// 文件: src/utils/constants.rs
// 职责: 应用程序常量定义
// 边界:
//   - ✅ 应用名称和图标字符
//   - ✅ 扫描时跳过的目录
//   - ✅ 已知语言代码列表
//   - ❌ 不应包含动态配置
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

/// 应用名称常量
pub const APP_NAME: &str = "LARA";

/// 图标
pub mod icons {
    /// 成功图标
    pub const SUCCESS: &str = "✓";
    /// 错误图标
    pub const ERROR: &str = "✗";
    /// 文件图标
    pub const FILE: &str = "●";
    /// 未变化图标
    pub const SKIP: &str = "○";
    /// 箭头图标
    pub const ARROW: &str = "→";
    /// 时间图标
    pub const TIME: &str = "⧖";
}

/// 加载 spinner 字符
pub mod spinner_chars {
    pub const BASE: &str = "⠋⠙⠹⠸⠼⠴⠦⠧ ";
}

/// 扫描项目时跳过的目录
pub const IGNORED_DIRS: &[&str] = &["node_modules", ".git", "target", "dist"];

/// 可被识别为语言目录或文件名的代码
pub const KNOWN_LOCALES: &[&str] = &[
    "af", "am", "ar", "az", "be", "bg", "bn", "bs", "ca", "cs", "cy", "da", "de", "de-AT",
    "de-CH", "el", "en", "en-AU", "en-CA", "en-GB", "en-US", "es", "es-ES", "es-MX", "et",
    "eu", "fa", "fi", "fil", "fr", "fr-CA", "fr-FR", "ga", "gl", "gu", "he", "hi", "hr", "hu",
    "hy", "id", "is", "it", "ja", "ka", "kk", "km", "kn", "ko", "lo", "lt", "lv", "mk", "ml",
    "mn", "mr", "ms", "my", "nb", "ne", "nl", "nn", "no", "pa", "pl", "pt", "pt-BR", "pt-PT",
    "ro", "ru", "si", "sk", "sl", "sq", "sr", "sv", "sw", "ta", "te", "th", "tr", "uk", "ur",
    "uz", "vi", "zh", "zh-CN", "zh-Hans", "zh-Hant", "zh-HK", "zh-TW", "zu",
];
