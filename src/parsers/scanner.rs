// ============================================================================
// Lara - 括号扫描器
// ============================================================================
//
// 文件: src/parsers/scanner.rs
// 职责: 在 JSON / JS 文本中按括号深度定位对象字面量的范围
// 边界:
//   - ✅ 跳过字符串和注释内容的括号匹配
//   - ✅ 顶层对象成员的键和值范围
//   - ❌ 不应构造语法树
//   - ❌ 不应修改文本
//
// ============================================================================

/// 顶层对象成员
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// 反转义后的键
    pub key: String,
    /// 值的起始字节位置
    pub value_start: usize,
    /// 值的结束字节位置（不含）
    pub value_end: usize,
}

/// 从引号处跳过整个字符串，返回结束引号之后的位置
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// 若 start 处是注释，返回注释之后的位置
fn skip_comment(bytes: &[u8], start: usize) -> Option<usize> {
    if bytes[start] != b'/' || start + 1 >= bytes.len() {
        return None;
    }
    match bytes[start + 1] {
        b'/' => {
            let mut i = start + 2;
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            Some(i)
        }
        b'*' => {
            let mut i = start + 2;
            while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                i += 1;
            }
            Some((i + 2).min(bytes.len()))
        }
        _ => None,
    }
}

/// 返回与 open 处的 `{` 或 `[` 匹配的闭合括号位置
pub fn find_matching(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if !matches!(bytes.get(open), Some(b'{') | Some(b'[')) {
        return None;
    }
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' | b'`' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'/' => {
                if let Some(next) = skip_comment(bytes, i) {
                    i = next;
                    continue;
                }
            }
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// pos 所在行的行首缩进
pub fn line_indent(text: &str, pos: usize) -> String {
    let line_start = text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    text[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

/// 跳过空白和注释
fn skip_trivia(bytes: &[u8], mut i: usize, end: usize) -> usize {
    while i < end {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
        } else if let Some(next) = skip_comment(bytes, i) {
            i = next;
        } else {
            break;
        }
    }
    i
}

/// 列出 `{`..`}` 之间的顶层成员（键需带引号，即 JSON 风格）
pub fn object_members(text: &str, open: usize, close: usize) -> Vec<Member> {
    let bytes = text.as_bytes();
    let mut members = Vec::new();
    let mut i = open + 1;

    loop {
        i = skip_trivia(bytes, i, close);
        if i >= close || bytes[i] != b'"' {
            break;
        }
        let key_end = skip_string(bytes, i);
        let raw_key = &text[i..key_end];
        let key = serde_json::from_str::<String>(raw_key)
            .unwrap_or_else(|_| raw_key.trim_matches('"').to_string());

        i = skip_trivia(bytes, key_end, close);
        if i >= close || bytes[i] != b':' {
            break;
        }
        let value_start = skip_trivia(bytes, i + 1, close);

        let mut j = value_start;
        let mut last_significant = value_start;
        while j < close {
            match bytes[j] {
                b'"' | b'\'' | b'`' => {
                    j = skip_string(bytes, j);
                    last_significant = j;
                    continue;
                }
                b'{' | b'[' => match find_matching(text, j) {
                    Some(end) => {
                        j = end + 1;
                        last_significant = j;
                        continue;
                    }
                    None => {
                        j = close;
                        break;
                    }
                },
                b',' => break,
                b'/' => {
                    if let Some(next) = skip_comment(bytes, j) {
                        j = next;
                        continue;
                    }
                    last_significant = j + 1;
                }
                b if b.is_ascii_whitespace() => {}
                _ => last_significant = j + 1,
            }
            j += 1;
        }

        members.push(Member {
            key,
            value_start,
            value_end: last_significant,
        });

        if j >= close {
            break;
        }
        i = j + 1;
    }

    members
}
