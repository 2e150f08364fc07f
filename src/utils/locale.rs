// ============================================================================
// Lara - 语言路径工具
// ============================================================================
//
// 文件: src/utils/locale.rs
// 职责: [locale] 占位符替换、包含路径展开和项目内语言发现
// 边界:
//   - ✅ 占位符替换和通配符展开
//   - ✅ 将展开结果还原为 [locale] 模板
//   - ✅ 扫描项目树发现语言代码和翻译文件
//   - ❌ 不应读取文件内容
//   - ❌ 不应包含翻译流程逻辑
//
// ============================================================================

use glob::Pattern;
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use super::constants::{IGNORED_DIRS, KNOWN_LOCALES};
use crate::error::{LaraError, Result};
use crate::parsers::factory::file_type_for;

/// 路径中的语言占位符
pub const LOCALE_PLACEHOLDER: &str = "[locale]";

/// 一个源文件及其路径模板
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPath {
    /// 含 [locale] 的模板（多语言单文件时与 source 相同）
    pub template: String,
    /// 源语言文件的相对路径
    pub source: String,
}

impl ResolvedPath {
    /// 模板中没有占位符时，所有语言共用一个文件
    pub fn is_multi_locale(&self) -> bool {
        !has_placeholder(&self.template)
    }

    pub fn target(&self, locale: &str) -> String {
        substitute(&self.template, locale)
    }
}

pub fn has_placeholder(path: &str) -> bool {
    path.contains(LOCALE_PLACEHOLDER)
}

/// 替换所有 [locale] 占位符
pub fn substitute(template: &str, locale: &str) -> String {
    template.replace(LOCALE_PLACEHOLDER, locale)
}

fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.trim_start_matches("./").to_string()
}

fn is_glob(path: &str) -> bool {
    path.contains('*') || path.contains('?')
}

/// 模板转为匹配具体路径的正则，占位符位置为捕获组
fn template_regex(template: &str, locale: &str) -> Option<Regex> {
    let mut out = String::from("^");
    let mut rest = template;
    while let Some(c) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix(LOCALE_PLACEHOLDER) {
            out.push('(');
            out.push_str(&regex::escape(locale));
            out.push(')');
            rest = after;
        } else if let Some(after) = rest.strip_prefix("**/") {
            out.push_str("(?:.*/)?");
            rest = after;
        } else if let Some(after) = rest.strip_prefix("**") {
            out.push_str(".*");
            rest = after;
        } else {
            match c {
                '*' => out.push_str("[^/]*"),
                '?' => out.push_str("[^/]"),
                _ => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
            }
            rest = &rest[c.len_utf8()..];
        }
    }
    out.push('$');
    Regex::new(&out).ok()
}

/// 把展开后的具体路径还原为模板
pub fn template_for(template: &str, locale: &str, concrete: &str) -> Option<String> {
    let regex = template_regex(template, locale)?;
    let captures = regex.captures(concrete)?;
    let mut result = String::new();
    let mut cursor = 0;
    for group in captures.iter().skip(1).flatten() {
        result.push_str(&concrete[cursor..group.start()]);
        result.push_str(LOCALE_PLACEHOLDER);
        cursor = group.end();
    }
    result.push_str(&concrete[cursor..]);
    Some(result)
}

/// 展开包含路径：替换源语言后按通配符匹配文件
pub fn resolve_include(root: &Path, include: &str, source_locale: &str) -> Result<Vec<ResolvedPath>> {
    let template = normalize(include);
    let substituted = substitute(&template, source_locale);
    if !is_glob(&substituted) {
        return Ok(vec![ResolvedPath {
            template,
            source: substituted,
        }]);
    }

    let root_text = root.to_string_lossy().replace('\\', "/");
    let pattern = format!(
        "{}/{}",
        Pattern::escape(root_text.trim_end_matches('/')),
        substituted
    );
    let entries = glob::glob(&pattern)
        .map_err(|e| LaraError::Config(format!("invalid include pattern '{}': {}", include, e)))?;

    let mut resolved = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Skipping unreadable path: {}", e);
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let relative = normalize(&relative.to_string_lossy());
        match template_for(&template, source_locale, &relative) {
            Some(file_template) => resolved.push(ResolvedPath {
                template: file_template,
                source: relative,
            }),
            None => tracing::warn!("{} does not match include pattern {}", relative, include),
        }
    }
    resolved.sort_by(|a, b| a.source.cmp(&b.source));
    Ok(resolved)
}

/// 排除模式是否命中
pub fn is_excluded(path: &str, excludes: &[String], source_locale: &str) -> bool {
    excludes.iter().any(|exclude| {
        let pattern = substitute(&normalize(exclude), source_locale);
        match Pattern::new(&pattern) {
            Ok(compiled) => {
                compiled.matches(path)
                    || path.starts_with(&format!("{}/", pattern.trim_end_matches('/')))
            }
            Err(_) => path == pattern,
        }
    })
}

fn canonical(code: &str) -> String {
    code.replace('_', "-").to_ascii_lowercase()
}

/// 是否为已知的语言代码（大小写、"-" / "_" 不敏感）
pub fn is_known_locale(code: &str) -> bool {
    let code = canonical(code);
    KNOWN_LOCALES.iter().any(|known| canonical(known) == code)
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| IGNORED_DIRS.contains(&name))
            .unwrap_or(false)
}

fn project_files(root: &Path) -> impl Iterator<Item = String> + '_ {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_ignored_dir(entry))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(move |entry| {
            entry
                .path()
                .strip_prefix(root)
                .ok()
                .map(|p| normalize(&p.to_string_lossy()))
        })
}

/// 路径中看起来像语言代码的部分：目录名和文件名的点分段
fn locale_like_parts(relative: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = relative.split('/').collect();
    let file_name = segments.pop().unwrap_or_default();
    let mut parts = segments;
    let mut name_parts: Vec<&str> = file_name.split('.').collect();
    if name_parts.len() > 1 {
        name_parts.pop();
    }
    parts.extend(name_parts);
    parts
}

/// 扫描项目树中出现的语言代码
pub fn discover_locales(root: &Path) -> Vec<String> {
    let mut found = IndexSet::new();
    for relative in project_files(root) {
        if file_type_for(&relative).is_none() {
            continue;
        }
        for part in locale_like_parts(&relative) {
            if is_known_locale(part) {
                found.insert(part.to_string());
            }
        }
    }
    let mut locales: Vec<String> = found.into_iter().collect();
    locales.sort();
    locales
}

/// 把路径中等于源语言的目录名或文件名分段替换为占位符
fn templatize(relative: &str, source_locale: &str) -> Option<String> {
    let mut segments: Vec<String> = relative.split('/').map(str::to_string).collect();
    let last = segments.len().checked_sub(1)?;
    let mut replaced = false;

    for segment in segments.iter_mut().take(last) {
        if segment == source_locale {
            *segment = LOCALE_PLACEHOLDER.to_string();
            replaced = true;
        }
    }

    let mut name_parts: Vec<String> = segments[last].split('.').map(str::to_string).collect();
    let stem_parts = name_parts.len().saturating_sub(1).max(1);
    for part in name_parts.iter_mut().take(stem_parts) {
        if part == source_locale {
            *part = LOCALE_PLACEHOLDER.to_string();
            replaced = true;
        }
    }
    segments[last] = name_parts.join(".");

    replaced.then(|| segments.join("/"))
}

/// 按文件类型收集源语言翻译文件的路径模板
pub fn discover_include_paths(root: &Path, source_locale: &str) -> IndexMap<String, Vec<String>> {
    let mut found: IndexMap<String, IndexSet<String>> = IndexMap::new();
    for relative in project_files(root) {
        let Some(file_type) = file_type_for(&relative) else {
            continue;
        };
        if let Some(template) = templatize(&relative, source_locale) {
            found
                .entry(file_type.to_string())
                .or_default()
                .insert(template);
        }
    }
    found
        .into_iter()
        .map(|(file_type, templates)| {
            let mut templates: Vec<String> = templates.into_iter().collect();
            templates.sort();
            (file_type, templates)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn test_substitute_every_placeholder() {
        assert_eq!(substitute("[locale]/app.[locale].json", "it"), "it/app.it.json");
        assert!(has_placeholder("src/[locale].json"));
        assert!(!has_placeholder("src/i18n.ts"));
    }

    #[test]
    fn test_template_for() {
        assert_eq!(
            template_for("src/[locale]/*.json", "en", "src/en/common.json").as_deref(),
            Some("src/[locale]/common.json")
        );
        assert_eq!(
            template_for("docs/**/*.[locale].md", "en", "docs/guide/intro.en.md").as_deref(),
            Some("docs/guide/intro.[locale].md")
        );
        assert_eq!(template_for("src/[locale]/*.json", "en", "src/it/common.json"), None);
    }

    #[test]
    fn test_resolve_literal_and_glob() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "locales/en/common.json");
        touch(dir.path(), "locales/en/errors.json");
        touch(dir.path(), "locales/it/common.json");

        let literal = resolve_include(dir.path(), "./locales/[locale].json", "en").unwrap();
        assert_eq!(literal.len(), 1);
        assert_eq!(literal[0].source, "locales/en.json");
        assert_eq!(literal[0].target("it"), "locales/it.json");

        let globbed = resolve_include(dir.path(), "locales/[locale]/*.json", "en").unwrap();
        let sources: Vec<&str> = globbed.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["locales/en/common.json", "locales/en/errors.json"]);
        assert_eq!(globbed[1].target("fr"), "locales/fr/errors.json");
        assert!(!globbed[0].is_multi_locale());
    }

    #[test]
    fn test_multi_locale_glob() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/components/App.vue");
        let resolved = resolve_include(dir.path(), "src/**/*.vue", "en").unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].is_multi_locale());
        assert_eq!(resolved[0].target("it"), "src/components/App.vue");
    }

    #[test]
    fn test_excludes() {
        let excludes = vec!["locales/[locale]/legacy/**".to_string(), "tmp".to_string()];
        assert!(is_excluded("locales/en/legacy/old.json", &excludes, "en"));
        assert!(is_excluded("tmp/en.json", &excludes, "en"));
        assert!(!is_excluded("locales/en/common.json", &excludes, "en"));
    }

    #[test]
    fn test_known_locales() {
        assert!(is_known_locale("en"));
        assert!(is_known_locale("pt_BR"));
        assert!(is_known_locale("zh-cn"));
        assert!(!is_known_locale("common"));
    }

    #[test]
    fn test_discovery_skips_ignored_dirs() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/i18n/en.json");
        touch(dir.path(), "src/i18n/it.json");
        touch(dir.path(), "docs/guide.fr.md");
        touch(dir.path(), "res/values-de/strings.xml");
        touch(dir.path(), "node_modules/pkg/locales/ja.json");
        touch(dir.path(), "locales/pt-BR/common.json");

        assert_eq!(discover_locales(dir.path()), vec!["en", "fr", "it", "pt-BR"]);

        let includes = discover_include_paths(dir.path(), "en");
        assert_eq!(includes["json"], vec!["src/i18n/[locale].json"]);
        assert_eq!(includes.len(), 1);
    }

    #[test]
    fn test_templatize() {
        assert_eq!(templatize("po/en.po", "en").as_deref(), Some("po/[locale].po"));
        assert_eq!(templatize("locales/en/common.json", "en").as_deref(), Some("locales/[locale]/common.json"));
        assert_eq!(templatize("docs/intro.en.mdx", "en").as_deref(), Some("docs/intro.[locale].mdx"));
        assert_eq!(templatize("src/en.ts/index.json", "en"), None);
        assert_eq!(templatize("src/app.json", "en"), None);
    }
}
