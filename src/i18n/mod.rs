// ============================================================================
// Lara - 国际化模块
// ============================================================================
//
// 文件: src/i18n/mod.rs
// 职责: 命令行界面文本的多语言支持
// 边界:
//   - ✅ 翻译表查找
//   - ✅ 翻译宏定义和实现
//   - ✅ 界面语言设置（进程内设置一次）
//   - ✅ 参数化翻译支持
//   - ❌ 不应包含具体翻译内容
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

pub mod en_us;
pub mod zh_cn;

use std::sync::OnceLock;

static LANGUAGE: OnceLock<String> = OnceLock::new();

/// 设置界面语言，只有第一次调用生效
pub fn set_language(language: &str) {
    let _ = LANGUAGE.set(language.to_ascii_lowercase().replace('-', "_"));
}

/// 当前界面语言
pub fn current_language() -> &'static str {
    LANGUAGE.get().map(String::as_str).unwrap_or("en_us")
}

/// 获取翻译文本
pub fn get_translation(key: &str) -> String {
    let translation_data = match current_language() {
        "zh_cn" | "zh" => zh_cn::TRANSLATIONS,
        _ => en_us::TRANSLATIONS,
    };

    translation_data
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
        .unwrap_or_else(|| format!("Unknown translation key: {}", key))
}

/// 简单翻译宏
#[macro_export]
macro_rules! t {
    ($key:expr) => {
        $crate::i18n::get_translation($key)
    };
}

/// 带参数翻译的辅助函数
pub fn format_with_args(template: String, args: Vec<String>) -> String {
    let mut result = template;
    let mut search_from = 0;
    for arg in args.iter() {
        // 替换下一个 {} 占位符，参数本身含 {} 时不受影响
        if let Some(pos) = result[search_from..].find("{}") {
            let pos = search_from + pos;
            result.replace_range(pos..pos + 2, arg);
            search_from = pos + arg.len();
        }
    }
    result
}

/// 带参数的翻译宏
#[macro_export]
macro_rules! tf {
    ($key:expr, $($arg:expr),*) => {{
        let template = $crate::i18n::get_translation($key);
        let args = vec![$(format!("{}", $arg)),*];
        $crate::i18n::format_with_args(template, args)
    }};
}
