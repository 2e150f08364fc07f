// ============================================================================
// Lara - 解析器工厂
// ============================================================================
//
// 文件: src/parsers/factory.rs
// 职责: 按文件扩展名选择格式解析器
// 边界:
//   - ✅ 扩展名匹配（大小写不敏感，多点文件名取最后一段）
//   - ✅ 不支持的扩展名立即报错并列出支持的扩展名
//   - ❌ 不应持有除解析器之外的状态
//
// ============================================================================

use std::path::Path;

use super::android_xml::AndroidXmlParser;
use super::json::JsonParser;
use super::markdown::MarkdownParser;
use super::po::PoParser;
use super::ts_object::TsObjectParser;
use super::vue::VueParser;
use super::FormatParser;
use crate::error::{LaraError, Result};

/// 配置文件中可用的文件类型
pub const SUPPORTED_FILE_TYPES: &[&str] = &["json", "po", "xml", "ts", "vue", "md"];

/// 支持的扩展名
pub const SUPPORTED_EXTENSIONS: &[&str] = &["json", "po", "xml", "ts", "js", "vue", "md", "mdx"];

/// 绑定到单个文件的解析器
pub struct ParserFactory {
    parser: Box<dyn FormatParser>,
}

impl std::fmt::Debug for ParserFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserFactory")
            .field("parser", &self.parser.name())
            .finish()
    }
}

impl ParserFactory {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        let parser: Box<dyn FormatParser> = match extension.as_str() {
            "json" => Box::new(JsonParser::new()),
            "po" => Box::new(PoParser::new()),
            "xml" => Box::new(AndroidXmlParser::new()),
            "ts" | "js" => Box::new(TsObjectParser::new()),
            "vue" => Box::new(VueParser::new()),
            "md" => Box::new(MarkdownParser::new()),
            "mdx" => Box::new(MarkdownParser::mdx()),
            _ => {
                return Err(LaraError::UnsupportedFileType {
                    path: path.to_path_buf(),
                    extension,
                    supported: SUPPORTED_EXTENSIONS.join(", "),
                })
            }
        };

        Ok(Self { parser })
    }

    pub fn parser(&self) -> &dyn FormatParser {
        self.parser.as_ref()
    }

    /// 配置中的文件类型名
    pub fn file_type(&self) -> &'static str {
        self.parser.name()
    }
}

/// 扩展名对应的文件类型名
pub fn file_type_for(path: impl AsRef<Path>) -> Option<&'static str> {
    ParserFactory::new(path).ok().map(|factory| factory.file_type())
}
