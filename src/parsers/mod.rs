// ============================================================================
// Lara - 格式解析器模块
// ============================================================================
//
// 文件: src/parsers/mod.rs
// 职责: 格式解析器统一契约和公共类型
// 边界:
//   - ✅ FormatParser trait 定义
//   - ✅ 解析选项和序列化上下文
//   - ✅ 格式风格探测（缩进、换行）
//   - ✅ 子模块导出
//   - ❌ 不应包含具体格式实现
//   - ❌ 不应包含校验和逻辑
//   - ❌ 不应包含翻译流程
//
// ============================================================================

pub mod android_xml;
pub mod factory;
pub mod flatten;
pub mod json;
pub mod markdown;
pub mod po;
pub mod scanner;
pub mod ts_object;
pub mod vue;

pub use factory::ParserFactory;

use crate::error::Result;
use crate::models::translation::FlatMap;

/// 解析选项
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// 多语言文件中要提取的语言
    pub locale: Option<String>,
    /// PO: 空 msgstr 时回退到 msgid（读取源文件时使用）
    pub untranslated_as_source: bool,
}

impl ParseOptions {
    /// 读取源文件的选项
    pub fn source(locale: Option<&str>) -> Self {
        Self {
            locale: locale.map(str::to_string),
            untranslated_as_source: true,
        }
    }

    /// 读取目标文件的选项
    pub fn target(locale: Option<&str>) -> Self {
        Self {
            locale: locale.map(str::to_string),
            untranslated_as_source: false,
        }
    }
}

/// 文本格式风格
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattingHints {
    /// 单级缩进
    pub indent: String,
    /// 换行符
    pub newline: &'static str,
    /// 文件末尾是否有换行
    pub trailing_newline: bool,
}

impl Default for FormattingHints {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            newline: "\n",
            trailing_newline: true,
        }
    }
}

impl FormattingHints {
    /// 从已有文本探测风格，无法判断的部分使用默认值
    pub fn detect(raw: &str) -> Self {
        let mut hints = Self::default();
        if raw.trim().is_empty() {
            return hints;
        }

        if raw.contains("\r\n") {
            hints.newline = "\r\n";
        }
        hints.trailing_newline = raw.ends_with('\n');

        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let leading: String = line
                .chars()
                .take_while(|c| *c == ' ' || *c == '\t')
                .collect();
            if leading.is_empty() {
                continue;
            }
            hints.indent = if leading.starts_with('\t') {
                "\t".to_string()
            } else {
                leading
            };
            break;
        }

        hints
    }

    /// 按风格收尾文本
    pub fn finish(&self, body: String) -> String {
        let mut body = if self.newline == "\n" {
            body
        } else {
            body.replace("\r\n", "\n").replace('\n', self.newline)
        };
        let trimmed_len = body.trim_end_matches(|c: char| c == '\r' || c == '\n').len();
        body.truncate(trimmed_len);
        if self.trailing_newline {
            body.push_str(self.newline);
        }
        body
    }
}

/// 序列化上下文
#[derive(Debug, Clone, Default)]
pub struct SerializeContext {
    /// 目标文件原始内容（不存在时为回退骨架）
    pub original_content: String,
    /// 源文件内容
    pub source_content: String,
    /// 多语言文件中要写入的语言块
    pub target_locale: Option<String>,
    /// 目标文件的语言（写入 PO 头部等元数据）
    pub language: Option<String>,
    /// 输出风格
    pub hints: FormattingHints,
}

impl SerializeContext {
    pub fn new(original_content: impl Into<String>) -> Self {
        let original_content = original_content.into();
        let hints = FormattingHints::detect(&original_content);
        Self {
            original_content,
            hints,
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source_content: impl Into<String>) -> Self {
        self.source_content = source_content.into();
        self
    }

    pub fn with_locale(mut self, locale: Option<&str>) -> Self {
        self.target_locale = locale.map(str::to_string);
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    pub fn with_hints(mut self, hints: FormattingHints) -> Self {
        self.hints = hints;
        self
    }
}

/// 格式解析器统一契约
pub trait FormatParser: Send + Sync {
    /// 文件类型名（与配置中的 files 键一致）
    fn name(&self) -> &'static str;

    /// 解析内容为扁平键值表
    fn parse(&self, content: &str, options: &ParseOptions) -> Result<FlatMap>;

    /// 将扁平键值表写回文件内容
    fn serialize(&self, data: &FlatMap, context: &SerializeContext) -> Result<String>;

    /// 目标文件不存在时的初始内容
    fn fallback(&self) -> String;

    /// 供展示和键模式匹配使用的键
    fn display_key(&self, key: &str) -> String {
        flatten::display_key(key)
    }

    /// 单个文件能否按语言分块存放多个语言
    fn supports_locale_blocks(&self) -> bool {
        false
    }
}
