// ============================================================================
// Lara - Android XML 解析器
// ============================================================================
//
// 文件: src/parsers/android_xml.rs
// 职责: Android strings.xml 资源文件的解析和写回
// 边界:
//   - ✅ <string> 和 <plurals>/<item> 的读取
//   - ✅ 基于字节位置的文档模型，未修改部分原样输出
//   - ✅ 新资源按源文件顺序插入，已删除资源连同前导空白移除
//   - ❌ 不应修改 translatable="false" 的条目
//   - ❌ 不应修改其他资源类型、注释和空白
//
// 文档模型:
// head + <resources> + [节点...] + 结尾空白 + </resources> + tail
// 节点为原样文本、<string> 或 <plurals>，只有被编辑过的元素会重新生成内容。
//
// ============================================================================

use indexmap::IndexMap;
use quick_xml::escape::{escape, partial_escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use serde_json::Value;

use super::flatten::{make_key, KEY_DELIMITER};
use super::{FormatParser, ParseOptions, SerializeContext};
use crate::error::{LaraError, Result};
use crate::models::translation::FlatMap;

const DEFAULT_INDENT: &str = "    ";

fn xml_error(e: impl std::fmt::Display) -> LaraError {
    LaraError::parse("xml", e.to_string())
}

fn attribute(e: &BytesStart, name: &str) -> Result<Option<String>> {
    match e.try_get_attribute(name).map_err(xml_error)? {
        Some(attr) => Ok(Some(attr.unescape_value().map_err(xml_error)?.into_owned())),
        None => Ok(None),
    }
}

/// 值中是否含有标记（内联标签、CDATA、注释）
fn looks_like_markup(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.iter().enumerate().any(|(i, b)| {
        *b == b'<'
            && bytes
                .get(i + 1)
                .map(|n| n.is_ascii_alphabetic() || matches!(n, b'/' | b'!' | b'?'))
                .unwrap_or(false)
    })
}

fn decode_value(inner: &str) -> String {
    if inner.contains('<') {
        return inner.to_string();
    }
    unescape(inner)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| inner.to_string())
}

fn encode_value(value: &str) -> String {
    if looks_like_markup(value) {
        value.to_string()
    } else {
        partial_escape(value).into_owned()
    }
}

/// 删除节点时去掉它前面那一行的缩进和换行
fn trim_trailing_line(raw: &mut String) {
    let mut kept = raw.trim_end_matches(|c: char| c == ' ' || c == '\t').len();
    if raw[..kept].ends_with('\n') {
        kept -= 1;
        if raw[..kept].ends_with('\r') {
            kept -= 1;
        }
    } else if kept != 0 {
        return;
    }
    raw.truncate(kept);
}

/// 最后一个换行之后的纯空白
fn indent_of(raw: &str) -> Option<String> {
    let tail = &raw[raw.rfind('\n')? + 1..];
    if tail.chars().all(|c| c == ' ' || c == '\t') && !tail.is_empty() {
        Some(tail.to_string())
    } else {
        None
    }
}

/// 带文本内容的元素（<string> 或 <item>）
#[derive(Debug, Clone)]
struct TextElement {
    tag: &'static str,
    open: String,
    inner: String,
    close: String,
    value: String,
}

impl TextElement {
    fn from_span(tag: &'static str, content: &str, start: usize, inner: (usize, usize), end: usize) -> Self {
        let raw_inner = &content[inner.0..inner.1];
        Self {
            tag,
            open: content[start..inner.0].to_string(),
            inner: raw_inner.to_string(),
            close: content[inner.1..end].to_string(),
            value: decode_value(raw_inner),
        }
    }

    fn empty(tag: &'static str, raw: &str) -> Self {
        Self {
            tag,
            open: raw.to_string(),
            inner: String::new(),
            close: String::new(),
            value: String::new(),
        }
    }

    fn new(tag: &'static str, open: String, value: &str) -> Self {
        Self {
            tag,
            open,
            inner: encode_value(value),
            close: format!("</{}>", tag),
            value: value.to_string(),
        }
    }

    fn set(&mut self, value: &str) {
        if self.value == value {
            return;
        }
        if self.close.is_empty() {
            // 自闭合元素展开为成对标签
            let open = self.open.trim_end_matches("/>").trim_end().to_string();
            self.open = format!("{}>", open);
            self.close = format!("</{}>", self.tag);
        }
        self.inner = encode_value(value);
        self.value = value.to_string();
    }

    fn render(&self, out: &mut String) {
        out.push_str(&self.open);
        out.push_str(&self.inner);
        out.push_str(&self.close);
    }
}

#[derive(Debug, Clone)]
enum PluralPart {
    Raw(String),
    Item { quantity: String, element: TextElement },
}

#[derive(Debug, Clone)]
struct PluralsElement {
    name: String,
    open: String,
    parts: Vec<PluralPart>,
    close: String,
}

impl PluralsElement {
    fn item_indent(&self) -> Option<String> {
        match (self.parts.first(), self.parts.get(1)) {
            (Some(PluralPart::Raw(raw)), Some(PluralPart::Item { .. })) => indent_of(raw),
            _ => None,
        }
    }

    fn has_item(&self, quantity: &str) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, PluralPart::Item { quantity: q, .. } if q == quantity))
    }

    fn apply(&mut self, items: &IndexMap<String, String>, indent: &str) {
        let item_indent = self.item_indent().unwrap_or_else(|| indent.repeat(2));

        let mut i = 0;
        while i < self.parts.len() {
            let keep = match &mut self.parts[i] {
                PluralPart::Raw(_) => true,
                PluralPart::Item { quantity, element } => match items.get(quantity.as_str()) {
                    Some(value) => {
                        element.set(value);
                        true
                    }
                    None => false,
                },
            };
            if keep {
                i += 1;
                continue;
            }
            self.parts.remove(i);
            if let Some(PluralPart::Raw(previous)) = i.checked_sub(1).and_then(|p| self.parts.get_mut(p)) {
                trim_trailing_line(previous);
            }
        }

        for (quantity, value) in items {
            if self.has_item(quantity) {
                continue;
            }
            let element = TextElement::new(
                "item",
                format!("<item quantity=\"{}\">", escape(quantity.as_str())),
                value,
            );
            let at = match self.parts.last() {
                Some(PluralPart::Raw(_)) => self.parts.len() - 1,
                _ => self.parts.len(),
            };
            self.parts.insert(at, PluralPart::Raw(format!("\n{}", item_indent)));
            self.parts.insert(
                at + 1,
                PluralPart::Item {
                    quantity: quantity.clone(),
                    element,
                },
            );
        }
    }

    fn render(&self, out: &mut String) {
        out.push_str(&self.open);
        for part in &self.parts {
            match part {
                PluralPart::Raw(raw) => out.push_str(raw),
                PluralPart::Item { element, .. } => element.render(out),
            }
        }
        out.push_str(&self.close);
    }
}

#[derive(Debug, Clone)]
enum Node {
    Raw(String),
    Str { name: String, element: TextElement },
    Plurals(PluralsElement),
}

impl Node {
    fn resource_name(&self) -> Option<&str> {
        match self {
            Node::Raw(_) => None,
            Node::Str { name, .. } => Some(name.as_str()),
            Node::Plurals(plurals) => Some(plurals.name.as_str()),
        }
    }
}

/// 资源文件的目标状态
enum Resource {
    Text(String),
    Plural(IndexMap<String, String>),
}

#[derive(Debug, Clone)]
struct XmlDocument {
    head: String,
    open: String,
    self_closing: bool,
    nodes: Vec<Node>,
    closing_ws: String,
    tail: String,
}

impl XmlDocument {
    fn parse(content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(content);
        reader.trim_text(false);

        // 定位 <resources> 根元素
        let (head_end, open_end, self_closing) = loop {
            let before = reader.buffer_position();
            match reader.read_event().map_err(xml_error)? {
                Event::Start(e) if e.name().as_ref() == b"resources" => {
                    break (before, reader.buffer_position(), false)
                }
                Event::Empty(e) if e.name().as_ref() == b"resources" => {
                    break (before, reader.buffer_position(), true)
                }
                Event::Start(_) | Event::Empty(_) => {
                    return Err(LaraError::parse("xml", "root element is not <resources>"))
                }
                Event::Eof => return Err(LaraError::parse("xml", "missing <resources> element")),
                _ => {}
            }
        };

        let mut document = XmlDocument {
            head: content[..head_end].to_string(),
            open: content[head_end..open_end].to_string(),
            self_closing,
            nodes: Vec::new(),
            closing_ws: String::new(),
            tail: content[open_end..].to_string(),
        };
        if self_closing {
            return Ok(document);
        }

        let mut cursor = open_end;
        loop {
            let before = reader.buffer_position();
            match reader.read_event().map_err(xml_error)? {
                Event::Start(e) => {
                    let tag = e.name().as_ref().to_vec();
                    let name = attribute(&e, "name")?;
                    let translatable = attribute(&e, "translatable")?.as_deref() != Some("false");
                    let open_end = reader.buffer_position();

                    let node = match (tag.as_slice(), name) {
                        (b"string", Some(name)) if translatable => {
                            let span = reader.read_to_end(QName(&tag)).map_err(xml_error)?;
                            let end = reader.buffer_position();
                            Some(Node::Str {
                                name,
                                element: TextElement::from_span(
                                    "string",
                                    content,
                                    before,
                                    (span.start as usize, span.end as usize),
                                    end,
                                ),
                            })
                        }
                        (b"plurals", Some(name)) if translatable => Some(Node::Plurals(
                            read_plurals(&mut reader, content, name, before, open_end)?,
                        )),
                        _ => {
                            reader.read_to_end(QName(&tag)).map_err(xml_error)?;
                            None
                        }
                    };

                    if let Some(node) = node {
                        if before > cursor {
                            document.nodes.push(Node::Raw(content[cursor..before].to_string()));
                        }
                        document.nodes.push(node);
                        cursor = reader.buffer_position();
                    }
                }
                Event::Empty(e) => {
                    let name = attribute(&e, "name")?;
                    let translatable = attribute(&e, "translatable")?.as_deref() != Some("false");
                    if let (b"string", Some(name), true) = (e.name().as_ref(), name, translatable) {
                        let end = reader.buffer_position();
                        if before > cursor {
                            document.nodes.push(Node::Raw(content[cursor..before].to_string()));
                        }
                        document.nodes.push(Node::Str {
                            name,
                            element: TextElement::empty("string", &content[before..end]),
                        });
                        cursor = end;
                    }
                }
                Event::End(_) => {
                    document.closing_ws = content[cursor..before].to_string();
                    document.tail = content[before..].to_string();
                    break;
                }
                Event::Eof => return Err(LaraError::parse("xml", "unclosed <resources> element")),
                _ => {}
            }
        }

        Ok(document)
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.resource_name() == Some(name))
    }

    fn first_element(&self) -> Option<usize> {
        self.nodes.iter().position(|n| n.resource_name().is_some())
    }

    fn indent(&self) -> String {
        self.first_element()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| match &self.nodes[i] {
                Node::Raw(raw) => indent_of(raw),
                _ => None,
            })
            .unwrap_or_else(|| DEFAULT_INDENT.to_string())
    }

    fn remove_at(&mut self, index: usize) {
        self.nodes.remove(index);
        if let Some(Node::Raw(previous)) = index.checked_sub(1).and_then(|p| self.nodes.get_mut(p)) {
            trim_trailing_line(previous);
        }
    }

    fn apply(&mut self, resources: &IndexMap<String, Resource>) {
        let indent = self.indent();

        let mut i = 0;
        while i < self.nodes.len() {
            let keep = match &mut self.nodes[i] {
                Node::Raw(_) => true,
                Node::Str { name, element } => match resources.get(name.as_str()) {
                    Some(Resource::Text(value)) => {
                        element.set(value);
                        true
                    }
                    _ => false,
                },
                Node::Plurals(plurals) => match resources.get(plurals.name.as_str()) {
                    Some(Resource::Plural(items)) => {
                        plurals.apply(items, &indent);
                        true
                    }
                    _ => false,
                },
            };
            if keep {
                i += 1;
            } else {
                self.remove_at(i);
            }
        }

        let mut previous: Option<&str> = None;
        for (name, resource) in resources {
            if self.position_of(name).is_none() {
                let node = new_node(name, resource, &indent);
                let separator = Node::Raw(format!("\n{}", indent));
                match previous.and_then(|p| self.position_of(p)) {
                    Some(at) => {
                        self.nodes.insert(at + 1, separator);
                        self.nodes.insert(at + 2, node);
                    }
                    None => match self.first_element() {
                        Some(first) => {
                            self.nodes.insert(first, node);
                            self.nodes.insert(first + 1, separator);
                        }
                        None => {
                            self.nodes.push(separator);
                            self.nodes.push(node);
                        }
                    },
                }
            }
            previous = Some(name);
        }
    }

    fn flat(&self) -> FlatMap {
        let mut flat = FlatMap::new();
        for node in &self.nodes {
            match node {
                Node::Raw(_) => {}
                Node::Str { name, element } => {
                    flat.insert(name.clone(), Value::String(element.value.clone()));
                }
                Node::Plurals(plurals) => {
                    for part in &plurals.parts {
                        if let PluralPart::Item { quantity, element } = part {
                            flat.insert(
                                make_key(&[&plurals.name, quantity]),
                                Value::String(element.value.clone()),
                            );
                        }
                    }
                }
            }
        }
        flat
    }

    fn render(&self) -> String {
        let mut out = self.head.clone();
        if self.self_closing && !self.nodes.is_empty() {
            let open = self.open.trim_end_matches("/>").trim_end();
            out.push_str(open);
            out.push('>');
            self.render_nodes(&mut out);
            out.push_str("\n</resources>");
        } else {
            out.push_str(&self.open);
            self.render_nodes(&mut out);
            out.push_str(&self.closing_ws);
        }
        out.push_str(&self.tail);
        out
    }

    fn render_nodes(&self, out: &mut String) {
        for node in &self.nodes {
            match node {
                Node::Raw(raw) => out.push_str(raw),
                Node::Str { element, .. } => element.render(out),
                Node::Plurals(plurals) => plurals.render(out),
            }
        }
    }
}

fn read_plurals(
    reader: &mut Reader<&[u8]>,
    content: &str,
    name: String,
    start: usize,
    open_end: usize,
) -> Result<PluralsElement> {
    let mut parts = Vec::new();
    let mut cursor = open_end;

    loop {
        let before = reader.buffer_position();
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                let tag = e.name().as_ref().to_vec();
                let quantity = attribute(&e, "quantity")?;
                let span = reader.read_to_end(QName(&tag)).map_err(xml_error)?;
                let end = reader.buffer_position();
                if let (b"item", Some(quantity)) = (tag.as_slice(), quantity) {
                    if before > cursor {
                        parts.push(PluralPart::Raw(content[cursor..before].to_string()));
                    }
                    parts.push(PluralPart::Item {
                        quantity,
                        element: TextElement::from_span(
                            "item",
                            content,
                            before,
                            (span.start as usize, span.end as usize),
                            end,
                        ),
                    });
                    cursor = end;
                }
            }
            Event::Empty(e) => {
                if let (b"item", Some(quantity)) = (e.name().as_ref(), attribute(&e, "quantity")?) {
                    let end = reader.buffer_position();
                    if before > cursor {
                        parts.push(PluralPart::Raw(content[cursor..before].to_string()));
                    }
                    parts.push(PluralPart::Item {
                        quantity,
                        element: TextElement::empty("item", &content[before..end]),
                    });
                    cursor = end;
                }
            }
            Event::End(_) => {
                parts.push(PluralPart::Raw(content[cursor..before].to_string()));
                let end = reader.buffer_position();
                return Ok(PluralsElement {
                    name,
                    open: content[start..open_end].to_string(),
                    parts,
                    close: content[before..end].to_string(),
                });
            }
            Event::Eof => return Err(LaraError::parse("xml", "unclosed <plurals> element")),
            _ => {}
        }
    }
}

fn new_node(name: &str, resource: &Resource, indent: &str) -> Node {
    match resource {
        Resource::Text(value) => Node::Str {
            name: name.to_string(),
            element: TextElement::new(
                "string",
                format!("<string name=\"{}\">", escape(name)),
                value,
            ),
        },
        Resource::Plural(items) => {
            let mut plurals = PluralsElement {
                name: name.to_string(),
                open: format!("<plurals name=\"{}\">", escape(name)),
                parts: vec![PluralPart::Raw(format!("\n{}", indent))],
                close: "</plurals>".to_string(),
            };
            plurals.apply(items, indent);
            Node::Plurals(plurals)
        }
    }
}

fn group_resources(data: &FlatMap) -> IndexMap<String, Resource> {
    let mut resources: IndexMap<String, Resource> = IndexMap::new();
    for (key, value) in data {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        match key.split_once(KEY_DELIMITER) {
            Some((name, quantity)) => {
                let entry = resources
                    .entry(name.to_string())
                    .or_insert_with(|| Resource::Plural(IndexMap::new()));
                if let Resource::Plural(items) = entry {
                    items.insert(quantity.to_string(), text);
                }
            }
            None => {
                resources.insert(key.clone(), Resource::Text(text));
            }
        }
    }
    resources
}

/// Android 字符串资源解析器
#[derive(Debug, Default)]
pub struct AndroidXmlParser;

impl AndroidXmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl FormatParser for AndroidXmlParser {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn parse(&self, content: &str, _options: &ParseOptions) -> Result<FlatMap> {
        if content.trim().is_empty() {
            return Ok(FlatMap::new());
        }
        match XmlDocument::parse(content) {
            Ok(document) => Ok(document.flat()),
            Err(e) => {
                tracing::warn!("Invalid Android XML, treating file as empty: {}", e);
                Ok(FlatMap::new())
            }
        }
    }

    fn serialize(&self, data: &FlatMap, context: &SerializeContext) -> Result<String> {
        let mut document = match XmlDocument::parse(&context.original_content) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Rebuilding Android XML from an empty skeleton: {}", e);
                XmlDocument::parse(&self.fallback())?
            }
        };
        document.apply(&group_resources(data));
        Ok(context.hints.finish(document.render()))
    }

    fn fallback(&self) -> String {
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<resources>\n</resources>\n".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!-- App strings -->
<resources xmlns:xliff="urn:oasis:names:tc:xliff:document:1.2">
    <string name="app_name" translatable="false">Lara</string>
    <string name="welcome">Welcome &amp; enjoy</string>
    <!-- Greeting with markup -->
    <string name="greeting">Hello <b>%1$s</b></string>
    <string name="raw"><![CDATA[<i>raw</i>]]></string>
    <color name="accent">#FF0000</color>
    <plurals name="files">
        <item quantity="one">%d file</item>
        <item quantity="other">%d files</item>
    </plurals>
</resources>
"#;

    fn parse(content: &str) -> FlatMap {
        AndroidXmlParser::new()
            .parse(content, &ParseOptions::default())
            .unwrap()
    }

    fn serialize(data: &FlatMap, original: &str) -> String {
        AndroidXmlParser::new()
            .serialize(data, &SerializeContext::new(original))
            .unwrap()
    }

    #[test]
    fn test_parse_strings_and_plurals() {
        let parser = AndroidXmlParser::new();
        let flat = parse(SAMPLE);
        let keys: Vec<String> = flat.keys().map(|k| parser.display_key(k)).collect();
        assert_eq!(keys, vec!["welcome", "greeting", "raw", "files/one", "files/other"]);
        assert_eq!(flat["welcome"], "Welcome & enjoy");
        assert_eq!(flat["greeting"], "Hello <b>%1$s</b>");
        assert_eq!(flat["raw"], "<![CDATA[<i>raw</i>]]>");
    }

    #[test]
    fn test_round_trip_is_exact() {
        assert_eq!(serialize(&parse(SAMPLE), SAMPLE), SAMPLE);
    }

    #[test]
    fn test_update_keeps_untranslatable_content() {
        let mut flat = parse(SAMPLE);
        flat.insert("welcome".into(), Value::String("Benvenuto & divertiti".into()));
        flat.insert(make_key(&["files", "one"]), Value::String("%d documento".into()));
        let output = serialize(&flat, SAMPLE);
        assert!(output.contains("<string name=\"welcome\">Benvenuto &amp; divertiti</string>"));
        assert!(output.contains("<item quantity=\"one\">%d documento</item>"));
        assert!(output.contains("<string name=\"app_name\" translatable=\"false\">Lara</string>"));
        assert!(output.contains("<color name=\"accent\">#FF0000</color>"));
        assert!(output.contains("<!-- Greeting with markup -->"));
    }

    #[test]
    fn test_new_target_from_fallback() {
        let parser = AndroidXmlParser::new();
        let flat = parse(SAMPLE);
        let output = serialize(&flat, &parser.fallback());
        let expected = r#"<?xml version="1.0" encoding="utf-8"?>
<resources>
    <string name="welcome">Welcome &amp; enjoy</string>
    <string name="greeting">Hello <b>%1$s</b></string>
    <string name="raw"><![CDATA[<i>raw</i>]]></string>
    <plurals name="files">
        <item quantity="one">%d file</item>
        <item quantity="other">%d files</item>
    </plurals>
</resources>
"#;
        assert_eq!(output, expected);
    }

    #[test]
    fn test_insert_follows_source_order() {
        let target = "<resources>\n    <string name=\"a\">A</string>\n    <string name=\"c\">C</string>\n</resources>\n";
        let mut flat = FlatMap::new();
        flat.insert("a".into(), Value::String("A".into()));
        flat.insert("b".into(), Value::String("B".into()));
        flat.insert("c".into(), Value::String("C".into()));
        assert_eq!(
            serialize(&flat, target),
            "<resources>\n    <string name=\"a\">A</string>\n    <string name=\"b\">B</string>\n    <string name=\"c\">C</string>\n</resources>\n"
        );
    }

    #[test]
    fn test_removed_resources_are_dropped() {
        let target = "<resources>\n    <string name=\"a\">A</string>\n    <string name=\"b\">B</string>\n    <plurals name=\"p\">\n        <item quantity=\"one\">1</item>\n        <item quantity=\"other\">n</item>\n    </plurals>\n</resources>\n";
        let mut flat = FlatMap::new();
        flat.insert("a".into(), Value::String("A".into()));
        flat.insert(make_key(&["p", "other"]), Value::String("n".into()));
        assert_eq!(
            serialize(&flat, target),
            "<resources>\n    <string name=\"a\">A</string>\n    <plurals name=\"p\">\n        <item quantity=\"other\">n</item>\n    </plurals>\n</resources>\n"
        );
    }

    #[test]
    fn test_self_closing_resources() {
        let mut flat = FlatMap::new();
        flat.insert("hi".into(), Value::String("Hi".into()));
        assert_eq!(
            serialize(&flat, "<resources/>\n"),
            "<resources>\n    <string name=\"hi\">Hi</string>\n</resources>\n"
        );
        assert!(parse("<resources/>").is_empty());
    }

    #[test]
    fn test_malformed_xml_is_empty() {
        assert!(parse("<resources><string name=\"a\">oops</resources>").is_empty());
        assert!(parse("<manifest></manifest>").is_empty());
    }
}
