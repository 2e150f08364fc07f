// ============================================================================
// Lara - gettext PO 解析器
// ============================================================================
//
// 文件: src/parsers/po.rs
// 职责: PO 文件的解析和写回
// 边界:
//   - ✅ 逐行解析 msgctxt / msgid / msgid_plural / msgstr[N]
//   - ✅ 多行字符串和转义序列
//   - ✅ 消息身份键（上下文 + 原文 + 复数下标）的编码
//   - ✅ 头部字段的更新（Language、PO-Revision-Date、X-Generator）
//   - ❌ 不应推算目标语言的复数规则（Plural-Forms 会被移除）
//   - ❌ 不应保留废弃条目（#~）
//
// 消息顺序:
// 解析器按文件顺序产出条目，FlatMap 的插入顺序即为条目顺序，
// 写回时按 (条目顺序, 复数下标) 输出。
//
// ============================================================================

use indexmap::IndexMap;
use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{FormatParser, ParseOptions, SerializeContext};
use crate::error::{LaraError, Result};
use crate::models::translation::FlatMap;

/// 写入 X-Generator 头的值
const GENERATOR: &str = concat!("Lara CLI ", env!("CARGO_PKG_VERSION"));

/// PO 消息身份键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoMessageKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msgctxt: Option<String>,
    pub msgid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msgid_plural: Option<String>,
    pub plural_index: usize,
}

impl PoMessageKey {
    pub fn encode(&self) -> String {
        // 只包含字符串和整数字段，序列化不会失败
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(key: &str) -> Result<Self> {
        serde_json::from_str(key)
            .map_err(|e| LaraError::serialize("po", format!("invalid message key {}: {}", key, e)))
    }
}

/// 单个 PO 条目
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoEntry {
    /// 原样保留的注释行
    pub comments: Vec<String>,
    pub msgctxt: Option<String>,
    pub msgid: String,
    pub msgid_plural: Option<String>,
    pub msgstr: Vec<String>,
    /// 每个字段在文件中的分行片段
    wrapping: HashMap<Field, Vec<String>>,
}

impl PoEntry {
    fn is_header(&self) -> bool {
        self.msgid.is_empty() && self.msgctxt.is_none()
    }

    fn identity(&self) -> (Option<String>, String) {
        (self.msgctxt.clone(), self.msgid.clone())
    }

    fn plural_forms(&self) -> usize {
        if self.msgid_plural.is_some() {
            self.msgstr.len().max(2)
        } else {
            1
        }
    }
}

/// 解析后的 PO 文档
#[derive(Debug, Clone, Default)]
pub struct PoDocument {
    pub header: Option<PoEntry>,
    pub entries: Vec<PoEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Field {
    Ctxt,
    Id,
    IdPlural,
    Str(usize),
}

/// 逐行解析器状态
struct PoReader {
    document: PoDocument,
    current: PoEntry,
    has_msgid: bool,
    field: Option<Field>,
}

impl PoReader {
    fn new() -> Self {
        Self {
            document: PoDocument::default(),
            current: PoEntry::default(),
            has_msgid: false,
            field: None,
        }
    }

    fn finish_entry(&mut self) {
        if self.has_msgid {
            let mut entry = std::mem::take(&mut self.current);
            if entry.msgstr.is_empty() {
                entry.msgstr.push(String::new());
            }
            if entry.is_header() && self.document.header.is_none() && self.document.entries.is_empty()
            {
                self.document.header = Some(entry);
            } else {
                self.document.entries.push(entry);
            }
        }
        self.has_msgid = false;
        self.field = None;
    }

    fn append(&mut self, field: Field, value: &str) {
        self.current
            .wrapping
            .entry(field)
            .or_default()
            .push(value.to_string());
        match field {
            Field::Ctxt => self.current.msgctxt.get_or_insert_with(String::new).push_str(value),
            Field::Id => self.current.msgid.push_str(value),
            Field::IdPlural => self
                .current
                .msgid_plural
                .get_or_insert_with(String::new)
                .push_str(value),
            Field::Str(index) => {
                if self.current.msgstr.len() <= index {
                    self.current.msgstr.resize(index + 1, String::new());
                }
                self.current.msgstr[index].push_str(value);
            }
        }
    }

    fn read_line(&mut self, line_no: usize, raw: &str) -> Result<()> {
        let line = raw.trim();

        if line.is_empty() {
            self.finish_entry();
            return Ok(());
        }
        if line.starts_with("#~") {
            return Ok(());
        }
        if line.starts_with('#') {
            if self.has_msgid {
                self.finish_entry();
            }
            self.current.comments.push(raw.trim_end().to_string());
            return Ok(());
        }

        if let Some(rest) = line.strip_prefix("msgctxt") {
            if self.has_msgid {
                self.finish_entry();
            }
            self.current.msgctxt = Some(String::new());
            self.field = Some(Field::Ctxt);
            self.append(Field::Ctxt, &unquote(line_no, rest)?);
        } else if let Some(rest) = line.strip_prefix("msgid_plural") {
            self.field = Some(Field::IdPlural);
            self.current.msgid_plural = Some(String::new());
            self.append(Field::IdPlural, &unquote(line_no, rest)?);
        } else if let Some(rest) = line.strip_prefix("msgid") {
            if self.has_msgid {
                self.finish_entry();
            }
            self.has_msgid = true;
            self.field = Some(Field::Id);
            self.append(Field::Id, &unquote(line_no, rest)?);
        } else if let Some(rest) = line.strip_prefix("msgstr[") {
            let close = rest.find(']').ok_or_else(|| {
                LaraError::parse("po", format!("line {}: missing ']' in msgstr index", line_no))
            })?;
            let index: usize = rest[..close].trim().parse().map_err(|_| {
                LaraError::parse("po", format!("line {}: invalid msgstr index", line_no))
            })?;
            self.field = Some(Field::Str(index));
            let value = unquote(line_no, &rest[close + 1..])?;
            self.append(Field::Str(index), &value);
        } else if let Some(rest) = line.strip_prefix("msgstr") {
            self.field = Some(Field::Str(0));
            let value = unquote(line_no, rest)?;
            self.append(Field::Str(0), &value);
        } else if line.starts_with('"') {
            let field = self.field.ok_or_else(|| {
                LaraError::parse("po", format!("line {}: string without keyword", line_no))
            })?;
            let value = unquote(line_no, line)?;
            self.append(field, &value);
        } else {
            return Err(LaraError::parse(
                "po",
                format!("line {}: unexpected content '{}'", line_no, line),
            ));
        }
        Ok(())
    }
}

/// 去掉引号并处理转义
fn unquote(line_no: usize, raw: &str) -> Result<String> {
    let s = raw.trim();
    if s.len() < 2 || !s.starts_with('"') || !s.ends_with('"') {
        return Err(LaraError::parse(
            "po",
            format!("line {}: expected quoted string, found '{}'", line_no, s),
        ));
    }
    let inner = &s[1..s.len() - 1];

    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('"') => result.push('"'),
                Some('\\') => result.push('\\'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => {
                    return Err(LaraError::parse(
                        "po",
                        format!("line {}: unterminated escape sequence", line_no),
                    ))
                }
            }
        } else {
            result.push(c);
        }
    }
    Ok(result)
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

/// 写出一个关键字字段
///
/// 值与原有分行片段一致时按原样分行，否则含内部换行时使用多行形式。
fn write_field(out: &mut String, keyword: &str, value: &str, wrapping: Option<&[String]>) {
    if let Some(chunks) = wrapping.filter(|c| !c.is_empty() && c.concat() == value) {
        out.push_str(keyword);
        out.push(' ');
        for chunk in chunks {
            out.push('"');
            out.push_str(&escape(chunk));
            out.push_str("\"\n");
        }
        return;
    }

    let inner_newline = value
        .char_indices()
        .any(|(i, c)| c == '\n' && i + 1 < value.len());
    if inner_newline {
        out.push_str(keyword);
        out.push_str(" \"\"\n");
        for part in value.split_inclusive('\n') {
            out.push('"');
            out.push_str(&escape(part));
            out.push_str("\"\n");
        }
    } else {
        out.push_str(keyword);
        out.push_str(" \"");
        out.push_str(&escape(value));
        out.push_str("\"\n");
    }
}

/// 已有条目中与当前值一致的分行方式
fn wrapping_for<'e>(known: &[&'e PoEntry], field: Field, value: &str) -> Option<&'e [String]> {
    known
        .iter()
        .filter_map(|entry| entry.wrapping.get(&field))
        .find(|chunks| chunks.concat() == value)
        .map(Vec::as_slice)
}

/// 解析 PO 文本
pub fn parse_document(content: &str) -> Result<PoDocument> {
    let mut reader = PoReader::new();
    for (index, line) in content.lines().enumerate() {
        reader.read_line(index + 1, line)?;
    }
    reader.finish_entry();
    Ok(reader.document)
}

/// 更新头部字段
fn rewrite_header(header: &str, language: Option<&str>) -> String {
    let mut fields: Vec<(String, Option<String>)> = header
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.split_once(':') {
            Some((name, value)) => (name.trim().to_string(), Some(value.trim().to_string())),
            None => (line.to_string(), None),
        })
        .collect();

    fields.retain(|(name, _)| name != "Plural-Forms");

    let revision = chrono::Local::now().format("%Y-%m-%d %H:%M%z").to_string();
    let mut updates = vec![
        ("PO-Revision-Date".to_string(), revision),
        ("X-Generator".to_string(), GENERATOR.to_string()),
    ];
    if let Some(language) = language {
        updates.insert(0, ("Language".to_string(), language.to_string()));
    }
    for (name, value) in updates {
        match fields.iter_mut().find(|(n, _)| *n == name) {
            Some(field) => field.1 = Some(value),
            None => fields.push((name, Some(value))),
        }
    }

    fields
        .into_iter()
        .map(|(name, value)| match value {
            Some(value) => format!("{}: {}\n", name, value),
            None => format!("{}\n", name),
        })
        .collect()
}

fn default_header() -> PoEntry {
    PoEntry {
        msgstr: vec![
            "MIME-Version: 1.0\nContent-Type: text/plain; charset=UTF-8\nContent-Transfer-Encoding: 8bit\n"
                .to_string(),
        ],
        ..Default::default()
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// gettext PO 解析器
#[derive(Debug, Default)]
pub struct PoParser;

impl PoParser {
    pub fn new() -> Self {
        Self
    }
}

impl FormatParser for PoParser {
    fn name(&self) -> &'static str {
        "po"
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<FlatMap> {
        let document = parse_document(content)?;
        let mut flat = FlatMap::new();

        for entry in &document.entries {
            for plural_index in 0..entry.plural_forms() {
                let translated = entry
                    .msgstr
                    .get(plural_index)
                    .filter(|s| !s.is_empty())
                    .cloned();
                let value = match translated {
                    Some(value) => value,
                    None if options.untranslated_as_source => {
                        if plural_index == 0 {
                            entry.msgid.clone()
                        } else {
                            entry.msgid_plural.clone().unwrap_or_else(|| entry.msgid.clone())
                        }
                    }
                    None => continue,
                };
                let key = PoMessageKey {
                    msgctxt: entry.msgctxt.clone(),
                    msgid: entry.msgid.clone(),
                    msgid_plural: entry.msgid_plural.clone(),
                    plural_index,
                };
                flat.insert(key.encode(), Value::String(value));
            }
        }

        Ok(flat)
    }

    fn serialize(&self, data: &FlatMap, context: &SerializeContext) -> Result<String> {
        let original = parse_document(&context.original_content)?;
        let source = parse_document(&context.source_content).unwrap_or_default();

        // 按消息分组，保持首次出现的顺序
        let mut messages: IndexMap<(Option<String>, String), PoEntry> = IndexMap::new();
        for (key, value) in data {
            let key = PoMessageKey::decode(key)?;
            let entry = messages
                .entry((key.msgctxt.clone(), key.msgid.clone()))
                .or_insert_with(|| PoEntry {
                    msgctxt: key.msgctxt.clone(),
                    msgid: key.msgid.clone(),
                    msgid_plural: key.msgid_plural.clone(),
                    ..Default::default()
                });
            if entry.msgstr.len() <= key.plural_index {
                entry.msgstr.resize(key.plural_index + 1, String::new());
            }
            entry.msgstr[key.plural_index] = value_text(value);
        }

        let find_comments = |identity: &(Option<String>, String)| -> Vec<String> {
            original
                .entries
                .iter()
                .chain(source.entries.iter())
                .find(|e| e.identity() == *identity)
                .map(|e| e.comments.clone())
                .unwrap_or_default()
        };

        let header = original
            .header
            .clone()
            .filter(|h| h.msgstr.iter().any(|s| !s.is_empty()))
            .or_else(|| source.header.clone())
            .unwrap_or_else(default_header);

        let mut out = String::new();
        for comment in &header.comments {
            out.push_str(comment);
            out.push('\n');
        }
        let header_text = header.msgstr.first().cloned().unwrap_or_default();
        out.push_str("msgid \"\"\nmsgstr \"\"\n");
        for line in rewrite_header(&header_text, context.language.as_deref())
            .split_inclusive('\n')
        {
            out.push('"');
            out.push_str(&escape(line));
            out.push_str("\"\n");
        }

        for (identity, entry) in &messages {
            out.push('\n');
            for comment in find_comments(identity) {
                out.push_str(&comment);
                out.push('\n');
            }
            let known: Vec<&PoEntry> = original
                .entries
                .iter()
                .chain(source.entries.iter())
                .filter(|e| e.identity() == *identity)
                .collect();
            let wrapping = |field: Field, value: &str| wrapping_for(&known, field, value);

            if let Some(ctxt) = &entry.msgctxt {
                write_field(&mut out, "msgctxt", ctxt, wrapping(Field::Ctxt, ctxt));
            }
            write_field(&mut out, "msgid", &entry.msgid, wrapping(Field::Id, &entry.msgid));
            match &entry.msgid_plural {
                Some(plural) => {
                    write_field(
                        &mut out,
                        "msgid_plural",
                        plural,
                        wrapping(Field::IdPlural, plural),
                    );
                    for (index, value) in entry.msgstr.iter().enumerate() {
                        let keyword = format!("msgstr[{}]", index);
                        let chunks = wrapping(Field::Str(index), value);
                        write_field(&mut out, &keyword, value, chunks);
                    }
                }
                None => {
                    let value = entry.msgstr.first().cloned().unwrap_or_default();
                    write_field(&mut out, "msgstr", &value, wrapping(Field::Str(0), &value));
                }
            }
        }

        Ok(context.hints.finish(out))
    }

    fn fallback(&self) -> String {
        "msgid \"\"\nmsgstr \"\"\n".to_string()
    }

    fn display_key(&self, key: &str) -> String {
        match PoMessageKey::decode(key) {
            Ok(PoMessageKey {
                msgctxt: Some(ctxt),
                msgid,
                ..
            }) => format!("{}/{}", ctxt, msgid),
            Ok(parsed) => parsed.msgid,
            Err(_) => key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"# Italian translations
msgid ""
msgstr ""
"Content-Type: text/plain; charset=UTF-8\n"
"Language: en\n"
"Plural-Forms: nplurals=2; plural=(n != 1);\n"

#: src/app.js:10
msgctxt "button"
msgid "Save"
msgstr "Save"

msgctxt "menu"
msgid "Save"
msgstr "Save document"

#, fuzzy
msgid "Cancel"
msgstr ""

msgid "One file"
msgid_plural "%d files"
msgstr[0] "One file"
msgstr[1] "%d files"

msgid ""
"Line one\n"
"Line two"
msgstr ""
"Line one\n"
"Line two"
"#;

    fn body(content: &str) -> &str {
        // 跳过头部后的正文
        let start = content.find("\n\n").unwrap();
        &content[start..]
    }

    #[test]
    fn test_parse_contexts_are_distinct() {
        let parser = PoParser::new();
        let flat = parser.parse(SAMPLE, &ParseOptions::source(None)).unwrap();
        let displayed: Vec<String> = flat.keys().map(|k| parser.display_key(k)).collect();
        assert_eq!(
            displayed,
            vec![
                "button/Save",
                "menu/Save",
                "Cancel",
                "One file",
                "One file",
                "Line one\nLine two"
            ]
        );
        assert_eq!(flat.values().nth(1).unwrap(), "Save document");
        // 源文件中空 msgstr 回退到 msgid
        assert_eq!(flat.values().nth(2).unwrap(), "Cancel");
        assert_eq!(flat.values().nth(4).unwrap(), "%d files");
    }

    #[test]
    fn test_target_skips_untranslated() {
        let parser = PoParser::new();
        let flat = parser.parse(SAMPLE, &ParseOptions::target(None)).unwrap();
        assert!(!flat.keys().any(|k| parser.display_key(k) == "Cancel"));
        assert_eq!(flat.len(), 5);
    }

    #[test]
    fn test_round_trip_body_is_exact() {
        let parser = PoParser::new();
        let flat = parser.parse(SAMPLE, &ParseOptions::target(None)).unwrap();
        let mut flat_all = parser.parse(SAMPLE, &ParseOptions::source(None)).unwrap();
        // "Cancel" 以空译文写回
        for (key, value) in flat_all.iter_mut() {
            if !flat.contains_key(key) {
                *value = Value::String(String::new());
            }
        }
        let context = SerializeContext::new(SAMPLE).with_language("en");
        let output = parser.serialize(&flat_all, &context).unwrap();
        assert_eq!(body(&output), body(SAMPLE));
    }

    #[test]
    fn test_wrapped_strings_keep_their_lines() {
        let parser = PoParser::new();
        let content = "msgid \"\"\nmsgstr \"\"\n\"Language: it\\n\"\n\nmsgid \"\"\n\"A long sentence \"\n\"split in two\"\nmsgstr \"\"\n\"Una frase lunga \"\n\"divisa in due\"\n\nmsgid \"Short\"\nmsgstr \"Corto\"\n";
        let mut flat = parser.parse(content, &ParseOptions::target(None)).unwrap();
        let context = SerializeContext::new(content).with_language("it");
        let output = parser.serialize(&flat, &context).unwrap();
        assert_eq!(body(&output), body(content));

        // 译文变化后按默认形式写出，msgid 仍保持原分行
        let key = flat.keys().next().unwrap().clone();
        flat.insert(key, Value::String("Frase nuova".into()));
        let output = parser.serialize(&flat, &context).unwrap();
        assert!(output.contains(
            "msgid \"\"\n\"A long sentence \"\n\"split in two\"\nmsgstr \"Frase nuova\"\n"
        ));
    }

    #[test]
    fn test_header_regenerated() {
        let parser = PoParser::new();
        let flat = parser.parse(SAMPLE, &ParseOptions::source(None)).unwrap();
        let context = SerializeContext::new(SAMPLE).with_language("it");
        let output = parser.serialize(&flat, &context).unwrap();
        assert!(output.starts_with("# Italian translations\nmsgid \"\"\nmsgstr \"\"\n"));
        assert!(output.contains("\"Language: it\\n\""));
        assert!(output.contains("\"X-Generator: Lara CLI"));
        assert!(output.contains("\"PO-Revision-Date: "));
        assert!(!output.contains("Plural-Forms"));
        assert!(output.contains("\"Content-Type: text/plain; charset=UTF-8\\n\""));
    }

    #[test]
    fn test_duplicate_msgid_with_context_preserved() {
        let parser = PoParser::new();
        let source = "msgctxt \"button\"\nmsgid \"Save\"\nmsgstr \"\"\n\nmsgctxt \"button\"\nmsgid \"Cancel\"\nmsgstr \"\"\n\nmsgid \"Save\"\nmsgstr \"\"\n";
        let mut flat = parser.parse(source, &ParseOptions::source(None)).unwrap();
        for value in flat.values_mut() {
            *value = Value::String(format!("[it] {}", value.as_str().unwrap()));
        }
        let context = SerializeContext::new(parser.fallback())
            .with_source(source)
            .with_language("it");
        let output = parser.serialize(&flat, &context).unwrap();
        assert!(output.contains("msgctxt \"button\"\nmsgid \"Save\"\nmsgstr \"[it] Save\"\n"));
        assert!(output.contains("msgctxt \"button\"\nmsgid \"Cancel\"\nmsgstr \"[it] Cancel\"\n"));
        assert!(output.contains("\n\nmsgid \"Save\"\nmsgstr \"[it] Save\"\n"));

        let reparsed = parser.parse(&output, &ParseOptions::target(None)).unwrap();
        assert_eq!(reparsed.len(), 3);
    }

    #[test]
    fn test_comments_copied_from_source_for_new_target() {
        let parser = PoParser::new();
        let flat = parser.parse(SAMPLE, &ParseOptions::source(None)).unwrap();
        let context = SerializeContext::new(parser.fallback()).with_source(SAMPLE);
        let output = parser.serialize(&flat, &context).unwrap();
        assert!(output.contains("#: src/app.js:10\nmsgctxt \"button\""));
        assert!(output.contains("#, fuzzy\nmsgid \"Cancel\""));
    }

    #[test]
    fn test_malformed_po_raises() {
        let parser = PoParser::new();
        assert!(parser
            .parse("msgid \"unterminated\nmsgstr \"\"\n", &ParseOptions::source(None))
            .is_err());
        assert!(parser
            .parse("msgid \"a\"\nmsgstr[x] \"b\"\n", &ParseOptions::source(None))
            .is_err());
        assert!(parser
            .parse("garbage line\n", &ParseOptions::source(None))
            .is_err());
    }

    #[test]
    fn test_escapes_round_trip() {
        let parser = PoParser::new();
        let content = "msgid \"Say \\\"hi\\\"\\tnow\\\\\"\nmsgstr \"\"\n";
        let flat = parser.parse(content, &ParseOptions::source(None)).unwrap();
        assert_eq!(flat.values().next().unwrap(), "Say \"hi\"\tnow\\");
        let output = parser
            .serialize(&flat, &SerializeContext::new(parser.fallback()))
            .unwrap();
        assert!(output.contains("msgstr \"Say \\\"hi\\\"\\tnow\\\\\"\n"));
    }
}
