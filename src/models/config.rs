// ============================================================================
// Lara - 配置数据模型
// ============================================================================
//
// 文件: src/models/config.rs
// 职责: 项目配置文件数据结构定义和操作
// 边界:
//   - ✅ 配置文件数据结构定义
//   - ✅ 配置序列化/反序列化
//   - ✅ 配置验证和默认值
//   - ✅ 配置文件读写操作
//   - ✅ CLI 运行时参数合并
//   - ❌ 不应包含翻译流程逻辑
//   - ❌ 不应包含文件格式解析
//   - ❌ 不应包含全局可变状态
//
// ============================================================================

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LaraError, Result};
use crate::parsers::factory::SUPPORTED_FILE_TYPES;

/// 默认配置文件名
pub const CONFIG_FILE_NAME: &str = "lara.yaml";

/// 校验和账本文件名
pub const LEDGER_FILE_NAME: &str = "lara.lock";

/// Lara 项目配置文件结构
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// 配置版本
    #[serde(default = "ProjectConfig::default_version")]
    pub version: String,
    /// 项目级配置
    #[serde(default)]
    pub project: ProjectSettings,
    /// 语言配置
    pub locales: LocalesConfig,
    /// 按文件类型分组的文件配置
    #[serde(default)]
    pub files: IndexMap<String, FileTypeConfig>,
    /// 翻译服务配置
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// 项目级配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    /// 传递给翻译服务的项目说明
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

/// 语言配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalesConfig {
    /// 源语言
    pub source: String,
    /// 目标语言列表
    #[serde(default)]
    pub target: Vec<String>,
}

/// 单个文件类型的配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTypeConfig {
    /// 包含的路径（可含 [locale] 占位符和通配符）
    #[serde(default)]
    pub include: Vec<String>,
    /// 排除的路径模式
    #[serde(default)]
    pub exclude: Vec<String>,
    /// 锁定的键模式（始终复制源值）
    #[serde(default)]
    pub locked_keys: Vec<String>,
    /// 忽略的键模式（不写入目标文件）
    #[serde(default)]
    pub ignored_keys: Vec<String>,
    /// 文件类型级说明
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

/// 翻译服务类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// HTTP 翻译服务
    #[default]
    Http,
    /// 伪翻译（"[it] Hello"）
    Pseudo,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Http => "http",
            ProviderKind::Pseudo => "pseudo",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 翻译服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// 服务类型
    #[serde(default)]
    pub kind: ProviderKind,
    /// HTTP 服务地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// 存放访问令牌的环境变量名
    #[serde(default = "ProjectConfig::default_api_key_env")]
    pub api_key_env: String,
    /// 请求超时时间（秒）
    #[serde(default = "ProjectConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

/// CLI 运行时参数（用于覆盖默认值）
#[derive(Debug, Clone, Default)]
pub struct RuntimeArgs {
    pub verbose: bool,
    pub show_progress: bool,
    pub workspace_root: Option<String>,
    pub config_path: Option<String>,
    pub language: Option<String>,
}

impl RuntimeArgs {
    /// 项目根目录
    pub fn project_root(&self) -> PathBuf {
        match &self.workspace_root {
            Some(root) => PathBuf::from(root),
            None => ProjectConfig::default_workspace_root(),
        }
    }

    /// 配置文件完整路径
    pub fn config_file(&self) -> PathBuf {
        let name = self
            .config_path
            .clone()
            .unwrap_or_else(|| CONFIG_FILE_NAME.to_string());
        let path = PathBuf::from(name);
        if path.is_absolute() {
            path
        } else {
            self.project_root().join(path)
        }
    }
}

/// 配置默认值 trait
pub trait ConfigDefaults {
    /// 获取默认工作区根目录
    fn default_workspace_root() -> PathBuf {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    /// 获取默认配置版本
    fn default_version() -> String {
        "1.0.0".to_string()
    }

    /// 获取默认源语言
    fn default_source_locale() -> String {
        "en".to_string()
    }

    /// 获取默认令牌环境变量
    fn default_api_key_env() -> String {
        "LARA_API_KEY".to_string()
    }

    /// 获取默认请求超时时间
    fn default_timeout_secs() -> u64 {
        30
    }
}

impl ConfigDefaults for ProjectConfig {}

impl ProjectConfig {
    /// 创建只包含语言信息的配置
    pub fn new(source: impl Into<String>, target: Vec<String>) -> Self {
        Self {
            version: Self::default_version(),
            project: ProjectSettings::default(),
            locales: LocalesConfig {
                source: source.into(),
                target,
            },
            files: IndexMap::new(),
            provider: ProviderConfig::default(),
        }
    }

    /// 从文件加载配置并校验
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LaraError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// 从 YAML 文本解析配置并校验
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: ProjectConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.locales.source.trim().is_empty() {
            return Err(LaraError::Config("source locale is empty".to_string()));
        }
        if self.locales.target.is_empty() {
            return Err(LaraError::Config(
                "at least one target locale is required".to_string(),
            ));
        }
        if self.locales.target.contains(&self.locales.source) {
            return Err(LaraError::Config(format!(
                "source locale '{}' cannot also be a target locale",
                self.locales.source
            )));
        }
        for (file_type, file_config) in &self.files {
            if !SUPPORTED_FILE_TYPES.contains(&file_type.as_str()) {
                return Err(LaraError::Config(format!(
                    "unsupported file type '{}', expected one of: {}",
                    file_type,
                    SUPPORTED_FILE_TYPES.join(", ")
                )));
            }
            if file_config.include.iter().any(|p| p.trim().is_empty()) {
                return Err(LaraError::Config(format!(
                    "file type '{}' has an empty include path",
                    file_type
                )));
            }
        }
        Ok(())
    }

    /// 文件类型配置（不存在时为空配置）
    pub fn file_type(&self, file_type: &str) -> FileTypeConfig {
        self.files.get(file_type).cloned().unwrap_or_default()
    }

    /// 拼接项目说明和文件类型说明
    pub fn instructions_for(&self, file_type: &str) -> Vec<String> {
        let mut instructions = Vec::new();
        if let Some(instruction) = &self.project.instruction {
            instructions.push(instruction.clone());
        }
        if let Some(instruction) = self.files.get(file_type).and_then(|f| f.instruction.clone())
        {
            instructions.push(instruction);
        }
        instructions
    }

    /// 生成默认配置模板
    pub fn generate_default_template(
        source: &str,
        targets: Vec<String>,
        files: IndexMap<String, FileTypeConfig>,
    ) -> Self {
        let mut config = Self::new(source, targets);
        config.files = files;
        config
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            endpoint: None,
            api_key_env: ProjectConfig::default_api_key_env(),
            timeout_secs: ProjectConfig::default_timeout_secs(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self::new(Self::default_source_locale(), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version: "1.0.0"
project:
  instruction: Friendly tone
locales:
  source: en
  target: [it, fr]
files:
  json:
    include: ["src/i18n/[locale].json"]
    lockedKeys: ["meta/*"]
    ignoredKeys: ["debug/*"]
    instruction: UI labels
  po:
    include: ["po/[locale].po"]
provider:
  kind: pseudo
"#;

    #[test]
    fn test_parse_sample_config() {
        let config = ProjectConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.locales.source, "en");
        assert_eq!(config.locales.target, vec!["it", "fr"]);
        assert_eq!(config.provider.kind, ProviderKind::Pseudo);
        assert_eq!(config.provider.api_key_env, "LARA_API_KEY");

        let json = config.file_type("json");
        assert_eq!(json.locked_keys, vec!["meta/*"]);
        assert_eq!(json.ignored_keys, vec!["debug/*"]);
        assert_eq!(
            config.instructions_for("json"),
            vec!["Friendly tone".to_string(), "UI labels".to_string()]
        );
        assert_eq!(config.instructions_for("po"), vec!["Friendly tone".to_string()]);
    }

    #[test]
    fn test_rejects_source_in_targets() {
        let err = ProjectConfig::from_yaml("locales:\n  source: en\n  target: [en, it]\n")
            .unwrap_err();
        assert!(err.to_string().contains("source locale"));
    }

    #[test]
    fn test_rejects_unknown_file_type() {
        let yaml = "locales:\n  source: en\n  target: [it]\nfiles:\n  yaml:\n    include: [a.yml]\n";
        let err = ProjectConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("unsupported file type"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut files = IndexMap::new();
        files.insert(
            "json".to_string(),
            FileTypeConfig {
                include: vec!["[locale].json".to_string()],
                ..Default::default()
            },
        );
        let config = ProjectConfig::generate_default_template("en", vec!["de".to_string()], files);
        config.save_to_file(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("include"));
        assert!(content.contains("apiKeyEnv"));

        let reloaded = ProjectConfig::load(&path).unwrap();
        assert_eq!(reloaded.locales.target, vec!["de"]);
        assert_eq!(reloaded.file_type("json").include, vec!["[locale].json"]);
    }
}
