// ============================================================================
// Lara - 错误类型
// ============================================================================
//
// 文件: src/error.rs
// 职责: 库层统一错误类型定义
// 边界:
//   - ✅ 错误枚举和显示文本
//   - ✅ 第三方错误到库错误的转换
//   - ✅ 翻译服务错误的分级（致命 / 文件级）
//   - ❌ 不应包含错误恢复逻辑
//   - ❌ 不应包含用户输出
//
// ============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// 翻译服务返回的错误
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProviderError {
    /// 类 HTTP 状态码（网络层错误时为空）
    pub status: Option<u16>,
    /// 错误描述
    pub message: String,
}

impl ProviderError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 认证失败或服务端错误会终止整次运行
    pub fn is_fatal(&self) -> bool {
        matches!(self.status, Some(code) if code == 401 || code >= 500)
    }
}

/// Lara 库层错误
#[derive(Debug, Error)]
pub enum LaraError {
    /// 不支持的文件扩展名
    #[error("Unsupported file type '{extension}' for {path}. Supported extensions: {supported}")]
    UnsupportedFileType {
        path: PathBuf,
        extension: String,
        supported: String,
    },

    /// 文件语法错误（对该文件致命）
    #[error("Failed to parse {format} content: {reason}")]
    Parse { format: &'static str, reason: String },

    /// 序列化失败
    #[error("Failed to write {format} content: {reason}")]
    Serialize { format: &'static str, reason: String },

    /// 配置文件错误
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// 校验和账本错误
    #[error("Failed to access checksum ledger {path}: {reason}")]
    Ledger { path: PathBuf, reason: String },

    /// 翻译服务错误
    #[error("Translation provider error: {0}")]
    Provider(#[from] ProviderError),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML 错误
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON 错误
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LaraError {
    pub fn parse(format: &'static str, reason: impl Into<String>) -> Self {
        Self::Parse {
            format,
            reason: reason.into(),
        }
    }

    pub fn serialize(format: &'static str, reason: impl Into<String>) -> Self {
        Self::Serialize {
            format,
            reason: reason.into(),
        }
    }

    /// 是否需要终止整次运行
    pub fn is_fatal(&self) -> bool {
        match self {
            LaraError::Provider(e) => e.is_fatal(),
            LaraError::Ledger { .. } => true,
            _ => false,
        }
    }
}

/// 库层 Result 别名
pub type Result<T> = std::result::Result<T, LaraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_classification() {
        assert!(ProviderError::new(Some(401), "unauthorized").is_fatal());
        assert!(ProviderError::new(Some(500), "boom").is_fatal());
        assert!(ProviderError::new(Some(503), "unavailable").is_fatal());
        assert!(!ProviderError::new(Some(400), "bad request").is_fatal());
        assert!(!ProviderError::new(Some(429), "slow down").is_fatal());
        assert!(!ProviderError::new(None, "connection reset").is_fatal());
    }

    #[test]
    fn test_unsupported_file_type_message() {
        let err = LaraError::UnsupportedFileType {
            path: PathBuf::from("locales/en.yml"),
            extension: "yml".to_string(),
            supported: "json, po".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("yml"));
        assert!(msg.contains("locales/en.yml"));
        assert!(msg.contains("json, po"));
    }

    #[test]
    fn test_fatal_propagates_through_lara_error() {
        let err: LaraError = ProviderError::new(Some(502), "bad gateway").into();
        assert!(err.is_fatal());
        let err = LaraError::parse("po", "unterminated string");
        assert!(!err.is_fatal());
    }
}
