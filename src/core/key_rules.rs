// ============================================================================
// Lara - 键规则
// ============================================================================
//
// 文件: src/core/key_rules.rs
// 职责: 锁定键和忽略键的通配符匹配
// 边界:
//   - ✅ 编译配置中的 lockedKeys / ignoredKeys 模式
//   - ✅ 以展示键（"/" 分隔）进行匹配，父路径命中时子键同样命中
//   - ❌ 不应决定翻译动作
//
// ============================================================================

use glob::{MatchOptions, Pattern};

use crate::error::{LaraError, Result};
use crate::models::config::FileTypeConfig;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// 一组编译后的键模式
#[derive(Debug, Clone, Default)]
pub struct KeyPatterns {
    patterns: Vec<Pattern>,
}

impl KeyPatterns {
    pub fn compile(sources: &[String]) -> Result<Self> {
        let patterns = sources
            .iter()
            .map(|source| {
                Pattern::new(source.trim_matches('/')).map_err(|e| {
                    LaraError::Config(format!("invalid key pattern '{}': {}", source, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// 键本身或任一父路径命中即视为命中
    pub fn matches(&self, key: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let mut ends: Vec<usize> = key.match_indices('/').map(|(i, _)| i).collect();
        ends.push(key.len());
        ends.into_iter().any(|end| {
            let candidate = &key[..end];
            self.patterns
                .iter()
                .any(|p| p.matches_with(candidate, MATCH_OPTIONS))
        })
    }
}

/// 单个文件类型的锁定 / 忽略规则
#[derive(Debug, Clone, Default)]
pub struct KeyRules {
    locked: KeyPatterns,
    ignored: KeyPatterns,
}

impl KeyRules {
    pub fn from_config(config: &FileTypeConfig) -> Result<Self> {
        Ok(Self {
            locked: KeyPatterns::compile(&config.locked_keys)?,
            ignored: KeyPatterns::compile(&config.ignored_keys)?,
        })
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.locked.matches(key)
    }

    pub fn is_ignored(&self, key: &str) -> bool {
        self.ignored.matches(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(locked: &[&str], ignored: &[&str]) -> KeyRules {
        KeyRules::from_config(&FileTypeConfig {
            locked_keys: locked.iter().map(|s| s.to_string()).collect(),
            ignored_keys: ignored.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_star_stays_within_segment() {
        let rules = rules(&["meta/*"], &["debug*"]);
        assert!(rules.is_locked("meta/title"));
        assert!(rules.is_locked("meta/author/name"));
        assert!(!rules.is_locked("metadata/title"));
        assert!(rules.is_ignored("debug_info"));
        assert!(rules.is_ignored("debug/trace"));
        assert!(!rules.is_ignored("app/debug"));
    }

    #[test]
    fn test_parent_key_covers_subtree() {
        let rules = rules(&["brand"], &[]);
        assert!(rules.is_locked("brand"));
        assert!(rules.is_locked("brand/name/short"));
        assert!(!rules.is_locked("branding"));
    }

    #[test]
    fn test_double_star_and_empty() {
        let rules = rules(&["**/id"], &[]);
        assert!(rules.is_locked("a/b/id"));
        assert!(!rules.is_locked("a/b/identity"));
        assert!(!KeyRules::default().is_locked("anything"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = KeyRules::from_config(&FileTypeConfig {
            locked_keys: vec!["[".to_string()],
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("invalid key pattern"));
    }
}
