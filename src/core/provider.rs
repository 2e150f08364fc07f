// ============================================================================
// Lara - 翻译服务
// ============================================================================
//
// 文件: src/core/provider.rs
// 职责: 翻译服务接口及其 HTTP / 伪翻译实现
// 边界:
//   - ✅ 统一的异步翻译接口
//   - ✅ HTTP 状态码到错误分级的映射
//   - ✅ 访问令牌从环境变量读取
//   - ❌ 不应包含重试逻辑
//   - ❌ 不应决定哪些键需要翻译
//
// ============================================================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{LaraError, ProviderError, Result};
use crate::models::config::{ProviderConfig, ProviderKind};

/// 单次翻译的附加选项
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    /// 项目说明、文件类型说明
    pub instructions: Vec<String>,
}

/// 翻译服务
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
        options: &TranslateOptions,
    ) -> std::result::Result<String, ProviderError>;
}

/// 伪翻译：在原文前加上 "[目标语言] "
#[derive(Debug, Clone, Default)]
pub struct PseudoProvider;

#[async_trait]
impl TranslationProvider for PseudoProvider {
    async fn translate(
        &self,
        text: &str,
        _source: &str,
        target: &str,
        _options: &TranslateOptions,
    ) -> std::result::Result<String, ProviderError> {
        Ok(format!("[{}] {}", target, text))
    }
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "no_instructions")]
    instructions: &'a [String],
}

fn no_instructions(instructions: &&[String]) -> bool {
    instructions.is_empty()
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translation: String,
}

/// 基于 HTTP JSON 接口的翻译服务
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key_env: String,
    api_key: Option<String>,
}

impl HttpProvider {
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let endpoint = config.endpoint.clone().ok_or_else(|| {
            LaraError::Config("provider.endpoint is required for the http provider".to_string())
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("lara-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LaraError::Config(format!("cannot build HTTP client: {}", e)))?;
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            client,
            endpoint,
            api_key_env: config.api_key_env.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl TranslationProvider for HttpProvider {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
        options: &TranslateOptions,
    ) -> std::result::Result<String, ProviderError> {
        let Some(api_key) = &self.api_key else {
            return Err(ProviderError::new(
                Some(401),
                format!("no API key found in environment variable {}", self.api_key_env),
            ));
        };

        let request = TranslateRequest {
            text,
            source,
            target,
            instructions: &options.instructions,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::new(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.to_string()
            } else {
                format!("{}: {}", status, body.trim())
            };
            return Err(ProviderError::new(Some(status.as_u16()), message));
        }

        let payload: TranslateResponse = response.json().await.map_err(|e| {
            ProviderError::new(None, format!("unexpected provider response: {}", e))
        })?;
        Ok(payload.translation)
    }
}

/// 按配置创建翻译服务
pub fn build_provider(config: &ProviderConfig) -> Result<Box<dyn TranslationProvider>> {
    match config.kind {
        ProviderKind::Pseudo => Ok(Box::new(PseudoProvider)),
        ProviderKind::Http => Ok(Box::new(HttpProvider::from_config(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pseudo_provider() {
        let provider = PseudoProvider;
        let out = provider
            .translate("Hello", "en", "it", &TranslateOptions::default())
            .await
            .unwrap();
        assert_eq!(out, "[it] Hello");
    }

    #[test]
    fn test_http_provider_requires_endpoint() {
        let err = HttpProvider::from_config(&ProviderConfig::default()).unwrap_err();
        assert!(err.to_string().contains("endpoint"));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_fatal() {
        let config = ProviderConfig {
            endpoint: Some("http://127.0.0.1:9/translate".to_string()),
            api_key_env: "LARA_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        let provider = HttpProvider::from_config(&config).unwrap();
        let err = provider
            .translate("Hello", "en", "it", &TranslateOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.message.contains("LARA_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_request_body_shape() {
        let instructions = vec!["Friendly tone".to_string()];
        let body = serde_json::to_value(TranslateRequest {
            text: "Hi",
            source: "en",
            target: "it",
            instructions: &instructions,
        })
        .unwrap();
        assert_eq!(body["instructions"][0], "Friendly tone");

        let body = serde_json::to_value(TranslateRequest {
            text: "Hi",
            source: "en",
            target: "it",
            instructions: &[],
        })
        .unwrap();
        assert!(body.get("instructions").is_none());
    }
}
