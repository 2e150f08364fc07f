// ============================================================================
// Lara - Markdown / MDX 解析器
// ============================================================================
//
// 文件: src/parsers/markdown.rs
// 职责: 按文档顺序提取 Markdown 文本片段，并以源文件为骨架写回
// 边界:
//   - ✅ 文本片段按出现顺序编号为 segment_0, segment_1, ...
//   - ✅ 跳过代码块、行内代码、HTML 和 YAML frontmatter
//   - ✅ MDX 的 import / export 段落不参与翻译
//   - ❌ 不保证字节级还原（渲染器会规范化列表符号、空行等）
//
// ============================================================================

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag};
use serde_json::Value;

use super::{FormatParser, ParseOptions, SerializeContext};
use crate::error::{LaraError, Result};
use crate::models::translation::FlatMap;

const SEGMENT_PREFIX: &str = "segment_";

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

/// 拆出开头的 `---` frontmatter，原样保留
fn split_frontmatter(content: &str) -> (&str, &str) {
    let Some(first_line_end) = content.find('\n') else {
        return ("", content);
    };
    if content[..first_line_end].trim_end() != "---" {
        return ("", content);
    }
    let mut offset = first_line_end + 1;
    for line in content[offset..].split_inclusive('\n') {
        offset += line.len();
        if line.trim_end() == "---" {
            return content.split_at(offset);
        }
    }
    ("", content)
}

/// 解析事件流，相邻文本事件合并为一个
fn events(body: &str) -> Vec<Event<'_>> {
    let mut out: Vec<Event> = Vec::new();
    for event in Parser::new_ext(body, options()) {
        if let Event::Text(text) = &event {
            if let Some(Event::Text(previous)) = out.last_mut() {
                let merged = format!("{}{}", &**previous, &**text);
                *previous = CowStr::from(merged);
                continue;
            }
        }
        out.push(event);
    }
    out
}

fn is_esm(text: &str) -> bool {
    text.starts_with("import ") || text.starts_with("export ")
}

/// 依次访问每个可翻译的文本事件
fn for_each_segment<'e>(
    events: &mut [Event<'e>],
    mdx: bool,
    mut visit: impl FnMut(usize, &mut CowStr<'e>),
) {
    let mut code_depth = 0usize;
    let mut skip_paragraph = false;
    let mut index = 0;

    for i in 0..events.len() {
        match &events[i] {
            Event::Start(Tag::CodeBlock(_)) => code_depth += 1,
            Event::End(Tag::CodeBlock(_)) => code_depth = code_depth.saturating_sub(1),
            Event::Start(Tag::Paragraph) if mdx => {
                skip_paragraph = matches!(events.get(i + 1), Some(Event::Text(t)) if is_esm(t));
            }
            Event::End(Tag::Paragraph) => skip_paragraph = false,
            _ => {}
        }

        if let Event::Text(text) = &mut events[i] {
            if code_depth == 0 && !skip_paragraph && !text.trim().is_empty() {
                visit(index, text);
                index += 1;
            }
        }
    }
}

/// 译文沿用原文的首尾空白
fn preserve_whitespace(original: &str, translated: &str) -> String {
    let trimmed = original.trim();
    if trimmed.is_empty() {
        return translated.to_string();
    }
    let start = original.find(trimmed).unwrap_or(0);
    let lead = &original[..start];
    let trail = &original[start + trimmed.len()..];
    format!("{}{}{}", lead, translated.trim(), trail)
}

/// Markdown / MDX 解析器
#[derive(Debug, Default)]
pub struct MarkdownParser {
    mdx: bool,
}

impl MarkdownParser {
    pub fn new() -> Self {
        Self { mdx: false }
    }

    pub fn mdx() -> Self {
        Self { mdx: true }
    }
}

impl FormatParser for MarkdownParser {
    fn name(&self) -> &'static str {
        "md"
    }

    fn parse(&self, content: &str, _options: &ParseOptions) -> Result<FlatMap> {
        let (_, body) = split_frontmatter(content);
        let mut events = events(body);
        let mut flat = FlatMap::new();
        for_each_segment(&mut events, self.mdx, |index, text| {
            flat.insert(
                format!("{}{}", SEGMENT_PREFIX, index),
                Value::String(String::from(&**text)),
            );
        });
        Ok(flat)
    }

    fn serialize(&self, data: &FlatMap, context: &SerializeContext) -> Result<String> {
        let skeleton = if context.source_content.trim().is_empty() {
            &context.original_content
        } else {
            &context.source_content
        };
        let (frontmatter, body) = split_frontmatter(skeleton);

        let mut events = events(body);
        for_each_segment(&mut events, self.mdx, |index, text| {
            let key = format!("{}{}", SEGMENT_PREFIX, index);
            if let Some(Value::String(translated)) = data.get(&key) {
                let replaced = preserve_whitespace(&**text, translated);
                *text = CowStr::from(replaced);
            }
        });

        let mut rendered = String::new();
        pulldown_cmark_to_cmark::cmark(events.into_iter(), &mut rendered)
            .map_err(|e| LaraError::serialize("markdown", e.to_string()))?;

        Ok(context.hints.finish(format!("{}{}", frontmatter, rendered)))
    }

    fn fallback(&self) -> String {
        String::new()
    }
}
