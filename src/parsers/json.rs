// ============================================================================
// Lara - JSON 解析器
// ============================================================================
//
// 文件: src/parsers/json.rs
// 职责: 结构化 JSON 翻译文件的解析和写回
// 边界:
//   - ✅ JSON / JSONC 解析
//   - ✅ 按目标文件风格输出（缩进、换行、末尾换行）
//   - ❌ 不应包含扁平化规则（见 flatten.rs）
//   - ❌ 不应包含多语言文件逻辑
//
// ============================================================================

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;

use super::flatten::{flatten_document, unflatten_document};
use super::{FormatParser, FormattingHints, ParseOptions, SerializeContext};
use crate::error::{LaraError, Result};
use crate::models::translation::FlatMap;

/// JSON 翻译文件解析器
#[derive(Debug, Default)]
pub struct JsonParser;

impl JsonParser {
    pub fn new() -> Self {
        Self
    }

    /// 去掉 // 和 /* */ 注释，支持 JSONC 文件
    pub fn strip_json_comments(content: &str) -> String {
        let mut result = String::with_capacity(content.len());
        let mut chars = content.chars().peekable();
        let mut in_string = false;
        let mut escape_next = false;

        while let Some(ch) = chars.next() {
            if escape_next {
                result.push(ch);
                escape_next = false;
                continue;
            }

            if ch == '\\' && in_string {
                result.push(ch);
                escape_next = true;
                continue;
            }

            if ch == '"' {
                in_string = !in_string;
                result.push(ch);
                continue;
            }

            if !in_string && ch == '/' {
                match chars.peek() {
                    Some('/') => {
                        for c in chars.by_ref() {
                            if c == '\n' {
                                result.push('\n');
                                break;
                            }
                        }
                        continue;
                    }
                    Some('*') => {
                        chars.next();
                        let mut prev = ' ';
                        for c in chars.by_ref() {
                            if prev == '*' && c == '/' {
                                break;
                            }
                            if c == '\n' {
                                result.push('\n');
                            }
                            prev = c;
                        }
                        continue;
                    }
                    _ => {}
                }
            }

            result.push(ch);
        }

        result
    }

    /// 按缩进风格输出 JSON 值
    pub fn to_pretty_string(value: &Value, hints: &FormattingHints) -> Result<String> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(hints.indent.as_bytes());
        let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
        value.serialize(&mut serializer)?;
        String::from_utf8(buffer).map_err(|e| LaraError::serialize("json", e.to_string()))
    }
}

impl FormatParser for JsonParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn parse(&self, content: &str, _options: &ParseOptions) -> Result<FlatMap> {
        if content.trim().is_empty() {
            return Ok(FlatMap::new());
        }
        let cleaned = Self::strip_json_comments(content);
        match serde_json::from_str::<Value>(&cleaned) {
            Ok(root) => Ok(flatten_document(&root)),
            Err(e) => {
                tracing::warn!("Invalid JSON syntax, treating file as empty: {}", e);
                Ok(FlatMap::new())
            }
        }
    }

    fn serialize(&self, data: &FlatMap, context: &SerializeContext) -> Result<String> {
        let value = unflatten_document(data);
        let body = Self::to_pretty_string(&value, &context.hints)?;
        Ok(context.hints.finish(body))
    }

    fn fallback(&self) -> String {
        "{}\n".to_string()
    }
}
