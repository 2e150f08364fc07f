// ============================================================================
// Lara - Vue 单文件组件解析器
// ============================================================================
//
// 文件: src/parsers/vue.rs
// 职责: 读取和写回 .vue 文件 <i18n> 块中的 JSON 消息
// 边界:
//   - ✅ 定位 <i18n> 块，解析其中的多语言 JSON 对象
//   - ✅ 只替换目标语言成员的文本范围，其余语言和模板/脚本原样保留
//   - ✅ 缺少语言成员或 <i18n> 块时追加
//   - ❌ 不应处理 <template> / <script> 内容
//   - ❌ 不应支持 YAML 格式的 <i18n> 块
//
// ============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::flatten::{flatten_document, unflatten_document};
use super::json::JsonParser;
use super::scanner::{find_matching, line_indent, object_members};
use super::{FormatParser, FormattingHints, ParseOptions, SerializeContext};
use crate::error::{LaraError, Result};
use crate::models::translation::FlatMap;

static I18N_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<i18n(?:\s[^>]*)?>(.*?)</i18n>").unwrap());

/// <i18n> 块正文的字节范围
fn block_body(content: &str) -> Option<(usize, usize)> {
    let body = I18N_BLOCK.captures(content)?.get(1)?;
    Some((body.start(), body.end()))
}

fn parse_body(body: &str) -> std::result::Result<Value, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(&JsonParser::strip_json_comments(body))
}

/// 续行统一加上前缀缩进
fn indent_continuation(text: &str, prefix: &str) -> String {
    text.split('\n')
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || line.is_empty() {
                line.to_string()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Vue SFC 解析器
#[derive(Debug, Default)]
pub struct VueParser;

impl VueParser {
    pub fn new() -> Self {
        Self
    }

    /// 替换或追加一个语言成员
    fn write_locale(
        body: &str,
        locale: &str,
        desired: &Value,
        hints: &FormattingHints,
    ) -> Result<String> {
        let open = body
            .find(|c: char| !c.is_whitespace())
            .filter(|i| body.as_bytes()[*i] == b'{');
        let Some(open) = open else {
            let mut wrapped = Map::new();
            wrapped.insert(locale.to_string(), desired.clone());
            let pretty = JsonParser::to_pretty_string(&Value::Object(wrapped), hints)?;
            return Ok(format!("\n{}\n", pretty));
        };
        let close = find_matching(body, open)
            .ok_or_else(|| LaraError::serialize("vue", "unbalanced braces in <i18n> block"))?;

        let members = object_members(body, open, close);
        if let Some(member) = members.iter().find(|m| m.key == locale) {
            let indent = line_indent(body, member.value_start);
            let pretty = JsonParser::to_pretty_string(desired, hints)?;
            return Ok(format!(
                "{}{}{}",
                &body[..member.value_start],
                indent_continuation(&pretty, &indent),
                &body[member.value_end..]
            ));
        }

        let insert_at = body[..close].trim_end().len();
        let previous = body[..insert_at].chars().last();
        let root_indent = line_indent(body, open);
        let inner = format!("{}{}", root_indent, hints.indent);
        let pretty = JsonParser::to_pretty_string(desired, hints)?;

        let mut text = String::new();
        if !matches!(previous, Some('{') | Some(',')) {
            text.push(',');
        }
        text.push('\n');
        text.push_str(&inner);
        text.push_str(&serde_json::to_string(locale)?);
        text.push_str(": ");
        text.push_str(&indent_continuation(&pretty, &inner));
        if !body[insert_at..close].contains('\n') {
            text.push('\n');
            text.push_str(&root_indent);
        }
        Ok(format!("{}{}{}", &body[..insert_at], text, &body[insert_at..]))
    }
}

impl FormatParser for VueParser {
    fn name(&self) -> &'static str {
        "vue"
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<FlatMap> {
        let Some((start, end)) = block_body(content) else {
            return Ok(FlatMap::new());
        };
        let root = match parse_body(&content[start..end]) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!("Invalid JSON in <i18n> block, treating file as empty: {}", e);
                return Ok(FlatMap::new());
            }
        };
        match &options.locale {
            Some(locale) => Ok(root.get(locale).map(flatten_document).unwrap_or_default()),
            None => Ok(flatten_document(&root)),
        }
    }

    fn serialize(&self, data: &FlatMap, context: &SerializeContext) -> Result<String> {
        let original = if context.original_content.trim().is_empty() {
            self.fallback()
        } else {
            context.original_content.clone()
        };
        let desired = unflatten_document(data);

        let Some((start, end)) = block_body(&original) else {
            let root = match &context.target_locale {
                Some(locale) => {
                    let mut wrapped = Map::new();
                    wrapped.insert(locale.clone(), desired);
                    Value::Object(wrapped)
                }
                None => desired,
            };
            let pretty = JsonParser::to_pretty_string(&root, &context.hints)?;
            let head = original.trim_end();
            let separator = if head.is_empty() { "" } else { "\n\n" };
            return Ok(context.hints.finish(format!(
                "{}{}<i18n>\n{}\n</i18n>\n",
                head, separator, pretty
            )));
        };

        let body = &original[start..end];
        let current = parse_body(body).map_err(|e| {
            LaraError::serialize("vue", format!("cannot update malformed <i18n> block: {}", e))
        })?;
        let hints = FormattingHints::detect(body);

        let new_body = match &context.target_locale {
            Some(locale) => {
                if current.get(locale) == Some(&desired) {
                    return Ok(context.hints.finish(original));
                }
                Self::write_locale(body, locale, &desired, &hints)?
            }
            None => {
                if current == desired {
                    return Ok(context.hints.finish(original));
                }
                format!("\n{}\n", JsonParser::to_pretty_string(&desired, &hints)?)
            }
        };

        Ok(context.hints.finish(format!(
            "{}{}{}",
            &original[..start],
            new_body,
            &original[end..]
        )))
    }

    fn fallback(&self) -> String {
        "<i18n>\n{}\n</i18n>\n".to_string()
    }

    fn supports_locale_blocks(&self) -> bool {
        true
    }
}
