// ============================================================================
// Lara - 扁平化编解码
// ============================================================================
//
// 文件: src/parsers/flatten.rs
// 职责: 嵌套文档与扁平键值表之间的可逆转换
// 边界:
//   - ✅ 私有分隔符拼接路径
//   - ✅ 数字字符串键的标记和还原
//   - ✅ 展示用键的生成
//   - ❌ 不应包含具体文件格式逻辑
//
// 编码规则:
// 1. 路径片段用 NUL 字符拼接，真实键中的 `/`、`.`、`-` 不会产生歧义
// 2. 对象中形如 "0"、"12" 的键和空字符串键在扁平化前加上 \u{2} 前缀，
//    还原时据此区分对象键和数组下标，空键也不会与根标量的键 "" 冲突
// 3. 空对象和空数组作为叶子值保留
//
// ============================================================================

use serde_json::{Map, Value};

use crate::models::translation::FlatMap;

/// 路径分隔符
pub const KEY_DELIMITER: char = '\u{0}';

/// 数字对象键标记
pub const NUMERIC_KEY_TAG: char = '\u{2}';

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn needs_tag(key: &str) -> bool {
    key.is_empty() || is_index(key)
}

/// 为数字字符串键和空键加上标记
pub fn tag_numeric_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut tagged = Map::new();
            for (key, child) in map {
                let key = if needs_tag(key) {
                    format!("{}{}", NUMERIC_KEY_TAG, key)
                } else {
                    key.clone()
                };
                tagged.insert(key, tag_numeric_keys(child));
            }
            Value::Object(tagged)
        }
        Value::Array(items) => Value::Array(items.iter().map(tag_numeric_keys).collect()),
        other => other.clone(),
    }
}

/// 去掉对象键上的数字标记
pub fn untag_numeric_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut untagged = Map::new();
            for (key, child) in map {
                let key = match key.strip_prefix(NUMERIC_KEY_TAG) {
                    Some(stripped) => stripped.to_string(),
                    None => key,
                };
                untagged.insert(key, untag_numeric_keys(child));
            }
            Value::Object(untagged)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(untag_numeric_keys).collect()),
        other => other,
    }
}

/// 扁平化（输入应已标记）
pub fn flatten(value: &Value) -> FlatMap {
    let mut out = FlatMap::new();
    match value {
        Value::Object(map) if !map.is_empty() => flatten_into(value, None, &mut out),
        Value::Array(items) if !items.is_empty() => flatten_into(value, None, &mut out),
        Value::Object(_) | Value::Array(_) => {}
        other => {
            out.insert(String::new(), other.clone());
        }
    }
    out
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}{}{}", prefix, KEY_DELIMITER, segment)
    }
}

fn flatten_into(value: &Value, prefix: Option<&str>, out: &mut FlatMap) {
    let child_key = |segment: &str| match prefix {
        Some(prefix) => format!("{}{}{}", prefix, KEY_DELIMITER, segment),
        None => segment.to_string(),
    };
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(child, Some(&child_key(key)), out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, Some(&child_key(&index.to_string())), out);
            }
        }
        leaf => {
            out.insert(prefix.unwrap_or_default().to_string(), leaf.clone());
        }
    }
}

fn container_for(segment: &str) -> Value {
    if is_index(segment) {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

fn child_slot<'v>(node: &'v mut Value, segment: &str, empty: Value) -> &'v mut Value {
    if is_index(segment) {
        if !node.is_array() {
            *node = Value::Array(Vec::new());
        }
        let index: usize = segment.parse().unwrap_or(0);
        let Value::Array(items) = node else {
            unreachable!("node was just made an array")
        };
        if items.len() <= index {
            items.resize(index + 1, Value::Null);
        }
        let slot = &mut items[index];
        if slot.is_null() {
            *slot = empty;
        }
        slot
    } else {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            unreachable!("node was just made an object")
        };
        map.entry(segment.to_string()).or_insert(empty)
    }
}

fn insert_path(node: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };
    match rest.first() {
        None => {
            let slot = child_slot(node, head, Value::Null);
            *slot = value;
        }
        Some(next) => {
            let slot = child_slot(node, head, container_for(next));
            if slot.is_array() != is_index(next) || !(slot.is_array() || slot.is_object()) {
                *slot = container_for(next);
            }
            insert_path(slot, rest, value);
        }
    }
}

/// 还原嵌套结构（输出仍带标记）
pub fn unflatten(map: &FlatMap) -> Value {
    let Some(first) = map.keys().next() else {
        return Value::Object(Map::new());
    };
    if map.len() == 1 && first.is_empty() {
        return map[first].clone();
    }

    let first_segment = first.split(KEY_DELIMITER).next().unwrap_or_default();
    let mut root = container_for(first_segment);
    for (key, value) in map {
        let segments: Vec<&str> = key.split(KEY_DELIMITER).collect();
        insert_path(&mut root, &segments, value.clone());
    }
    root
}

/// 完整的文档扁平化：标记后展开
pub fn flatten_document(value: &Value) -> FlatMap {
    flatten(&tag_numeric_keys(value))
}

/// 完整的文档还原：合并后去标记
pub fn unflatten_document(map: &FlatMap) -> Value {
    untag_numeric_keys(unflatten(map))
}

/// 拼接路径片段为扁平键（片段需已标记）
pub fn make_key(segments: &[&str]) -> String {
    segments.join(&KEY_DELIMITER.to_string())
}

/// 为展示和模式匹配生成的键
pub fn display_key(key: &str) -> String {
    key.split(KEY_DELIMITER)
        .map(|segment| segment.strip_prefix(NUMERIC_KEY_TAG).unwrap_or(segment))
        .collect::<Vec<_>>()
        .join("/")
}

/// 给扁平键加上前缀片段
pub fn prefix_key(prefix: &str, key: &str) -> String {
    join(prefix, key)
}

/// 去掉扁平键的首个片段，首片段不匹配时返回 None
pub fn strip_key_prefix<'k>(prefix: &str, key: &'k str) -> Option<&'k str> {
    let rest = key.strip_prefix(prefix)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix(KEY_DELIMITER)
}
