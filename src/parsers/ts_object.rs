// ============================================================================
// Lara - TypeScript / JavaScript 对象字面量解析器
// ============================================================================
//
// 文件: src/parsers/ts_object.rs
// 职责: 从 TS/JS 源码中定位消息对象字面量，读取和写回其中的字面量值
// 边界:
//   - ✅ 基于 oxc AST 的静态分析（从不执行代码）
//   - ✅ 只提取字符串、数字、布尔、null、数组和嵌套对象
//   - ✅ 未修改的子树原样输出，只替换对象字面量所在的文本范围
//   - ✅ 多语言对象中只改写目标语言的子树
//   - ❌ 不应求值函数调用、标识符、展开等非字面量节点
//
// 定位规则（优先级从高到低）:
// 1. export default { ... }
// 2. export const / const / let / var 的第一个对象字面量初始值
// 3. module.exports = { ... }
// 以上均可包裹 as / satisfies / 括号
//
// ============================================================================

use once_cell::sync::Lazy;
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    ArrayExpressionElement, Declaration, Expression, ObjectPropertyKind, Program, PropertyKey,
    Statement,
};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};
use regex::Regex;
use serde_json::{Map, Number, Value};

use super::flatten::{flatten_document, unflatten_document};
use super::scanner::line_indent;
use super::{FormatParser, ParseOptions, SerializeContext};
use crate::error::{LaraError, Result};
use crate::models::translation::FlatMap;

static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*\n\s*[}\]]").unwrap());

/// 字面量节点（拥有所有权，不依赖 AST 的分配器）
#[derive(Debug, Clone)]
enum LiteralNode {
    Scalar { value: Value, span: (usize, usize) },
    /// 非字面量，读取为 null
    Opaque { span: (usize, usize) },
    Object { members: Vec<MemberNode>, span: (usize, usize) },
    Array { items: Vec<LiteralNode>, span: (usize, usize) },
}

#[derive(Debug, Clone)]
enum MemberNode {
    Property {
        key: String,
        key_span: (usize, usize),
        value: LiteralNode,
        span: (usize, usize),
    },
    /// 展开、计算属性等，原样保留
    Verbatim { span: (usize, usize) },
}

fn range(span: Span) -> (usize, usize) {
    (span.start as usize, span.end as usize)
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl LiteralNode {
    fn span(&self) -> (usize, usize) {
        match self {
            LiteralNode::Scalar { span, .. }
            | LiteralNode::Opaque { span }
            | LiteralNode::Object { span, .. }
            | LiteralNode::Array { span, .. } => *span,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            LiteralNode::Scalar { value, .. } => value.clone(),
            LiteralNode::Opaque { .. } => Value::Null,
            LiteralNode::Object { members, .. } => {
                let mut map = Map::new();
                for member in members {
                    if let MemberNode::Property { key, value, .. } = member {
                        map.insert(key.clone(), value.to_value());
                    }
                }
                Value::Object(map)
            }
            LiteralNode::Array { items, .. } => {
                Value::Array(items.iter().map(LiteralNode::to_value).collect())
            }
        }
    }

    fn property(&self, name: &str) -> Option<(&MemberNode, &LiteralNode)> {
        let LiteralNode::Object { members, .. } = self else {
            return None;
        };
        members.iter().find_map(|member| match member {
            MemberNode::Property { key, value, .. } if key == name => Some((member, value)),
            _ => None,
        })
    }

    /// 第一个字符串字面量使用的引号
    fn quote_style(&self, src: &str) -> Option<char> {
        match self {
            LiteralNode::Scalar {
                value: Value::String(_),
                span,
            } => src[span.0..].chars().next().filter(|c| *c == '\'' || *c == '"'),
            LiteralNode::Object { members, .. } => members.iter().find_map(|m| match m {
                MemberNode::Property { value, .. } => value.quote_style(src),
                MemberNode::Verbatim { .. } => None,
            }),
            LiteralNode::Array { items, .. } => items.iter().find_map(|i| i.quote_style(src)),
            _ => None,
        }
    }
}

fn unwrap_expression<'p, 'a>(mut expr: &'p Expression<'a>) -> &'p Expression<'a> {
    loop {
        expr = match expr {
            Expression::TSAsExpression(e) => &e.expression,
            Expression::TSSatisfiesExpression(e) => &e.expression,
            Expression::ParenthesizedExpression(e) => &e.expression,
            _ => return expr,
        };
    }
}

fn object_in<'p, 'a>(expr: &'p Expression<'a>) -> Option<&'p Expression<'a>> {
    let expr = unwrap_expression(expr);
    matches!(expr, Expression::ObjectExpression(_)).then_some(expr)
}

fn find_object<'p, 'a>(program: &'p Program<'a>) -> Option<&'p Expression<'a>> {
    let mut declared = None;
    let mut assigned = None;

    for statement in &program.body {
        match statement {
            Statement::ExportDefaultDeclaration(export) => {
                if let Some(found) = export.declaration.as_expression().and_then(object_in) {
                    return Some(found);
                }
            }
            Statement::ExportNamedDeclaration(export) => {
                if let Some(Declaration::VariableDeclaration(declaration)) = &export.declaration {
                    if declared.is_none() {
                        declared = declaration
                            .declarations
                            .iter()
                            .find_map(|d| d.init.as_ref().and_then(object_in));
                    }
                }
            }
            Statement::VariableDeclaration(declaration) => {
                if declared.is_none() {
                    declared = declaration
                        .declarations
                        .iter()
                        .find_map(|d| d.init.as_ref().and_then(object_in));
                }
            }
            Statement::ExpressionStatement(statement) => {
                if let Expression::AssignmentExpression(assignment) = &statement.expression {
                    if assigned.is_none() {
                        assigned = object_in(&assignment.right);
                    }
                }
            }
            _ => {}
        }
    }

    declared.or(assigned)
}

fn property_key(key: &PropertyKey, computed: bool) -> Option<String> {
    if computed {
        return None;
    }
    match key {
        PropertyKey::StaticIdentifier(ident) => Some(ident.name.to_string()),
        PropertyKey::StringLiteral(lit) => Some(lit.value.to_string()),
        PropertyKey::NumericLiteral(lit) => Some(lit.value.to_string()),
        _ => None,
    }
}

fn convert(expr: &Expression, src: &str) -> LiteralNode {
    let expr = unwrap_expression(expr);
    let span = range(expr.span());
    match expr {
        Expression::StringLiteral(lit) => LiteralNode::Scalar {
            value: Value::String(lit.value.to_string()),
            span,
        },
        Expression::NumericLiteral(lit) => LiteralNode::Scalar {
            value: number_value(lit.value),
            span,
        },
        Expression::BooleanLiteral(lit) => LiteralNode::Scalar {
            value: Value::Bool(lit.value),
            span,
        },
        Expression::NullLiteral(_) => LiteralNode::Scalar {
            value: Value::Null,
            span,
        },
        Expression::TemplateLiteral(template)
            if template.expressions.is_empty() && template.quasis.len() == 1 =>
        {
            let quasi = &template.quasis[0].value;
            let text = quasi
                .cooked
                .as_ref()
                .map(|c| c.to_string())
                .unwrap_or_else(|| quasi.raw.to_string());
            LiteralNode::Scalar {
                value: Value::String(text),
                span,
            }
        }
        Expression::UnaryExpression(unary)
            if matches!(unary.argument, Expression::NumericLiteral(_)) =>
        {
            match src[span.0..span.1].trim().parse::<f64>() {
                Ok(n) => LiteralNode::Scalar {
                    value: number_value(n),
                    span,
                },
                Err(_) => LiteralNode::Opaque { span },
            }
        }
        Expression::ObjectExpression(object) => {
            let members = object
                .properties
                .iter()
                .map(|property| match property {
                    ObjectPropertyKind::ObjectProperty(p) => {
                        match property_key(&p.key, p.computed) {
                            Some(key) => MemberNode::Property {
                                key,
                                key_span: range(p.key.span()),
                                value: convert(&p.value, src),
                                span: range(p.span),
                            },
                            None => MemberNode::Verbatim {
                                span: range(p.span),
                            },
                        }
                    }
                    ObjectPropertyKind::SpreadProperty(spread) => MemberNode::Verbatim {
                        span: range(spread.span),
                    },
                })
                .collect();
            LiteralNode::Object { members, span }
        }
        Expression::ArrayExpression(array) => {
            let items = array
                .elements
                .iter()
                .map(|element| match element {
                    ArrayExpressionElement::SpreadElement(_) | ArrayExpressionElement::Elision(_) => {
                        LiteralNode::Opaque {
                            span: range(element.span()),
                        }
                    }
                    other => match other.as_expression() {
                        Some(expr) => convert(expr, src),
                        None => LiteralNode::Opaque {
                            span: range(other.span()),
                        },
                    },
                })
                .collect();
            LiteralNode::Array { items, span }
        }
        _ => LiteralNode::Opaque { span },
    }
}

/// 解析源码并提取消息对象
fn parse_tree(src: &str) -> Result<LiteralNode> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path("messages.ts").unwrap_or_default();
    let ret = Parser::new(&allocator, src, source_type).parse();

    if ret.panicked || !ret.errors.is_empty() {
        let reason = ret
            .errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unrecoverable syntax error".to_string());
        return Err(LaraError::parse("ts", reason));
    }

    let object = find_object(&ret.program)
        .ok_or_else(|| LaraError::parse("ts", "no exported object literal found"))?;
    Ok(convert(object, src))
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// 按原文件风格生成文本
struct Renderer<'s> {
    src: &'s str,
    quote: char,
    trailing_comma: bool,
    unit: String,
}

impl<'s> Renderer<'s> {
    fn new(src: &'s str, tree: &LiteralNode, unit: &str) -> Self {
        Self {
            src,
            quote: tree.quote_style(src).unwrap_or('"'),
            trailing_comma: TRAILING_COMMA.is_match(src),
            unit: unit.to_string(),
        }
    }

    fn text(&self, span: (usize, usize)) -> &'s str {
        &self.src[span.0..span.1]
    }

    fn quote(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        out.push(self.quote);
        for c in s.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c == self.quote => {
                    out.push('\\');
                    out.push(c);
                }
                c => out.push(c),
            }
        }
        out.push(self.quote);
        out
    }

    fn key(&self, key: &str) -> String {
        if is_identifier(key) {
            key.to_string()
        } else {
            self.quote(key)
        }
    }

    fn block(&self, open: char, close: char, entries: Vec<String>, base: &str, single_line: bool) -> String {
        if entries.is_empty() {
            return format!("{}{}", open, close);
        }
        if single_line {
            return match open {
                '{' => format!("{{ {} }}", entries.join(", ")),
                _ => format!("[{}]", entries.join(", ")),
            };
        }
        let inner = format!("{}{}", base, self.unit);
        let mut out = String::new();
        out.push(open);
        for (index, entry) in entries.iter().enumerate() {
            out.push('\n');
            out.push_str(&inner);
            out.push_str(entry);
            if index + 1 < entries.len() || self.trailing_comma {
                out.push(',');
            }
        }
        out.push('\n');
        out.push_str(base);
        out.push(close);
        out
    }

    /// 生成新值的文本
    fn fresh(&self, value: &Value, base: &str) -> String {
        let inner = format!("{}{}", base, self.unit);
        match value {
            Value::String(s) => self.quote(s),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::Object(map) => {
                let entries = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", self.key(k), self.fresh(v, &inner)))
                    .collect();
                self.block('{', '}', entries, base, false)
            }
            Value::Array(items) => {
                let scalars = items.iter().all(|v| !v.is_object() && !v.is_array());
                let entries = items.iter().map(|v| self.fresh(v, &inner)).collect();
                self.block('[', ']', entries, base, scalars)
            }
        }
    }

    /// 合并渲染：未变化的节点原样输出
    fn render(&self, node: &LiteralNode, desired: &Value, base: &str) -> String {
        if node.to_value() == *desired {
            return self.text(node.span()).to_string();
        }
        match (node, desired) {
            (LiteralNode::Object { members, span }, Value::Object(map)) => {
                let base = line_indent(self.src, span.0);
                let inner = format!("{}{}", base, self.unit);
                let single_line = !self.text(*span).contains('\n') && !members.is_empty();

                // 原有成员按原顺序输出，展开和计算键的相对位置不变
                let mut entries: Vec<(Option<&str>, String)> = Vec::new();
                for member in members {
                    match member {
                        MemberNode::Verbatim { span } => {
                            entries.push((None, self.text(*span).to_string()));
                        }
                        MemberNode::Property {
                            key,
                            key_span,
                            span,
                            value: child,
                        } => {
                            let Some(value) = map.get(key) else {
                                continue;
                            };
                            let text = if child.to_value() == *value {
                                self.text(*span).to_string()
                            } else {
                                format!("{}: {}", self.text(*key_span), self.render(child, value, &inner))
                            };
                            entries.push((Some(key.as_str()), text));
                        }
                    }
                }

                // 新键放在源顺序中前一个键之后
                let mut previous: Option<&str> = None;
                for (key, value) in map {
                    if node.property(key).is_none() {
                        let at = match previous {
                            Some(prev) => entries
                                .iter()
                                .position(|(k, _)| *k == Some(prev))
                                .map_or(entries.len(), |i| i + 1),
                            None => entries
                                .iter()
                                .position(|(k, _)| k.is_some())
                                .unwrap_or(entries.len()),
                        };
                        let text = format!("{}: {}", self.key(key), self.fresh(value, &inner));
                        entries.insert(at, (Some(key.as_str()), text));
                    }
                    previous = Some(key.as_str());
                }
                let entries = entries.into_iter().map(|(_, text)| text).collect();
                self.block('{', '}', entries, &base, single_line)
            }
            (LiteralNode::Array { items, span }, Value::Array(values)) => {
                let base = line_indent(self.src, span.0);
                let inner = format!("{}{}", base, self.unit);
                let single_line = !self.text(*span).contains('\n') && !items.is_empty();
                let entries = values
                    .iter()
                    .enumerate()
                    .map(|(index, value)| match items.get(index) {
                        Some(child) => self.render(child, value, &inner),
                        None => self.fresh(value, &inner),
                    })
                    .collect();
                self.block('[', ']', entries, &base, single_line)
            }
            _ => self.fresh(desired, base),
        }
    }

    /// 只改写某个语言的子树，不存在时追加到根对象末尾
    fn replace_locale(&self, root: &LiteralNode, locale: &str, desired: &Value) -> Result<String> {
        let LiteralNode::Object { span, .. } = root else {
            return Err(LaraError::serialize("ts", "message root is not an object literal"));
        };

        if let Some((_, child)) = root.property(locale) {
            let (start, end) = child.span();
            let rendered = self.render(child, desired, &line_indent(self.src, start));
            return Ok(format!("{}{}{}", &self.src[..start], rendered, &self.src[end..]));
        }

        let close = span.1 - 1;
        let insert_at = self.src[..close].trim_end().len();
        let previous = self.src[..insert_at].chars().last();
        let root_indent = line_indent(self.src, span.0);
        let inner = format!("{}{}", root_indent, self.unit);

        let mut text = String::new();
        if !matches!(previous, Some('{') | Some(',')) {
            text.push(',');
        }
        text.push('\n');
        text.push_str(&inner);
        text.push_str(&self.key(locale));
        text.push_str(": ");
        text.push_str(&self.fresh(desired, &inner));
        if self.trailing_comma {
            text.push(',');
        }
        if !self.src[insert_at..close].contains('\n') {
            text.push('\n');
            text.push_str(&root_indent);
        }

        Ok(format!("{}{}{}", &self.src[..insert_at], text, &self.src[insert_at..]))
    }
}

/// TS / JS 消息对象解析器
#[derive(Debug, Default)]
pub struct TsObjectParser;

impl TsObjectParser {
    pub fn new() -> Self {
        Self
    }
}

impl FormatParser for TsObjectParser {
    fn name(&self) -> &'static str {
        "ts"
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<FlatMap> {
        if content.trim().is_empty() {
            return Ok(FlatMap::new());
        }
        let value = parse_tree(content)?.to_value();
        match &options.locale {
            Some(locale) => Ok(value.get(locale).map(flatten_document).unwrap_or_default()),
            None => Ok(flatten_document(&value)),
        }
    }

    fn serialize(&self, data: &FlatMap, context: &SerializeContext) -> Result<String> {
        let original = if context.original_content.trim().is_empty() {
            self.fallback()
        } else {
            context.original_content.clone()
        };
        let tree = parse_tree(&original)?;
        let renderer = Renderer::new(&original, &tree, &context.hints.indent);
        let desired = unflatten_document(data);

        let output = match &context.target_locale {
            Some(locale) => renderer.replace_locale(&tree, locale, &desired)?,
            None => {
                let (start, end) = tree.span();
                let rendered = renderer.render(&tree, &desired, &line_indent(&original, start));
                format!("{}{}{}", &original[..start], rendered, &original[end..])
            }
        };
        Ok(context.hints.finish(output))
    }

    fn fallback(&self) -> String {
        "export default {}\n".to_string()
    }

    fn supports_locale_blocks(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::flatten::make_key;

    const MULTI: &str = r#"import { helper } from './helper';

const messages = {
  en: {
    home: {
      title: 'Welcome',
      count: 3,
    },
    greet: helper('hi'),
  },
  it: {
    home: {
      title: 'Benvenuto',
    },
  },
} as const;

export default messages;
"#;

    #[test]
    fn test_parse_locale_subtree() {
        let parser = TsObjectParser::new();
        let flat = parser.parse(MULTI, &ParseOptions::source(Some("en"))).unwrap();
        let keys: Vec<String> = flat.keys().map(|k| parser.display_key(k)).collect();
        assert_eq!(keys, vec!["home/title", "home/count", "greet"]);
        assert_eq!(flat[&make_key(&["home", "title"])], "Welcome");
        assert_eq!(flat[&make_key(&["home", "count"])], 3);
        assert_eq!(flat["greet"], Value::Null);

        let missing = parser.parse(MULTI, &ParseOptions::source(Some("fr"))).unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_serialize_replaces_only_target_locale() {
        let parser = TsObjectParser::new();
        let mut data = FlatMap::new();
        data.insert(make_key(&["home", "title"]), Value::String("[it] Welcome".into()));
        data.insert(make_key(&["home", "count"]), Value::from(3));
        let context = SerializeContext::new(MULTI).with_locale(Some("it"));
        let output = parser.serialize(&data, &context).unwrap();

        let expected = MULTI.replace(
            "  it: {\n    home: {\n      title: 'Benvenuto',\n    },\n  },",
            "  it: {\n    home: {\n      title: '[it] Welcome',\n      count: 3,\n    },\n  },",
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn test_round_trip_is_exact() {
        let parser = TsObjectParser::new();
        let flat = parser.parse(MULTI, &ParseOptions::default()).unwrap();
        let output = parser.serialize(&flat, &SerializeContext::new(MULTI)).unwrap();
        assert_eq!(output, MULTI);
    }

    #[test]
    fn test_new_file_from_fallback() {
        let parser = TsObjectParser::new();
        let mut data = FlatMap::new();
        data.insert("title".into(), Value::String("Hi".into()));
        data.insert(make_key(&["nested", "a"]), Value::String("b".into()));
        let context = SerializeContext::new(parser.fallback());
        let output = parser.serialize(&data, &context).unwrap();
        assert_eq!(
            output,
            "export default {\n  title: \"Hi\",\n  nested: {\n    a: \"b\"\n  }\n}\n"
        );
    }

    #[test]
    fn test_missing_locale_is_appended() {
        let parser = TsObjectParser::new();
        let source = "export default {\n  en: {\n    hi: 'Hello'\n  }\n};\n";
        let mut data = FlatMap::new();
        data.insert("hi".into(), Value::String("[fr] Hello".into()));
        let context = SerializeContext::new(source).with_locale(Some("fr"));
        assert_eq!(
            parser.serialize(&data, &context).unwrap(),
            "export default {\n  en: {\n    hi: 'Hello'\n  },\n  fr: {\n    hi: '[fr] Hello'\n  }\n};\n"
        );
    }

    #[test]
    fn test_non_literals_keep_source_text() {
        let parser = TsObjectParser::new();
        let source = "export default { ...base, label: 'x', action: helper, [dynamic]: 'y' };\n";
        let mut flat = parser.parse(source, &ParseOptions::default()).unwrap();
        assert_eq!(flat.len(), 2);
        flat.insert("label".into(), Value::String("z".into()));
        let output = parser.serialize(&flat, &SerializeContext::new(source)).unwrap();
        assert_eq!(
            output,
            "export default { ...base, label: 'z', action: helper, [dynamic]: 'y' };\n"
        );

        // 位于属性之后的展开仍然在后面，运行时覆盖关系不变
        let source = "export default { label: 'x', ...base, title: 't' };\n";
        let mut flat = parser.parse(source, &ParseOptions::default()).unwrap();
        flat.insert("label".into(), Value::String("z".into()));
        flat.shift_remove("title");
        flat.insert("extra".into(), Value::String("e".into()));
        let output = parser.serialize(&flat, &SerializeContext::new(source)).unwrap();
        assert_eq!(output, "export default { label: 'z', extra: 'e', ...base };\n");
    }

    #[test]
    fn test_syntax_error_raises() {
        let parser = TsObjectParser::new();
        let result = parser.parse("export default { a: 'x', ", &ParseOptions::default());
        assert!(matches!(result, Err(LaraError::Parse { .. })));
    }

    #[test]
    fn test_satisfies_and_string_keys() {
        let parser = TsObjectParser::new();
        let source = "export const messages = ({ \"not-ident\": `plain`, neg: -2 }) satisfies Record<string, unknown>;\n";
        let flat = parser.parse(source, &ParseOptions::default()).unwrap();
        assert_eq!(flat["not-ident"], "plain");
        assert_eq!(flat["neg"], -2);
    }
}
