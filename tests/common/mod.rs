#![allow(dead_code)]

use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use lara::core::checksum::{ChecksumTracker, MemoryLedgerStore};
use lara::core::engine::{EngineOptions, RunReport, TranslationEngine};
use lara::core::provider::{TranslateOptions, TranslationProvider};
use lara::models::config::ProjectConfig;
use lara::ProviderError;

/// 临时项目，多次运行共享同一个内存账本
pub struct Project {
    pub dir: TempDir,
    pub ledger: MemoryLedgerStore,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            ledger: MemoryLedgerStore::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root().join(relative)).unwrap()
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.root().join(relative).exists()
    }

    pub async fn run(
        &self,
        config: &ProjectConfig,
        provider: impl TranslationProvider + 'static,
    ) -> lara::Result<RunReport> {
        self.run_with(config, provider, EngineOptions::default()).await
    }

    pub async fn run_with(
        &self,
        config: &ProjectConfig,
        provider: impl TranslationProvider + 'static,
        options: EngineOptions,
    ) -> lara::Result<RunReport> {
        let tracker = ChecksumTracker::new(self.ledger.clone()).with_base_dir(self.root());
        let mut engine = TranslationEngine::new(config.clone(), self.root(), tracker, Box::new(provider))
            .with_options(options);
        engine.run().await
    }
}

pub fn config(yaml: &str) -> ProjectConfig {
    ProjectConfig::from_yaml(yaml).unwrap()
}

pub fn json_config(targets: &str) -> ProjectConfig {
    config(&format!(
        "locales:\n  source: en\n  target: [{}]\nfiles:\n  json:\n    include: [\"locales/[locale].json\"]\n",
        targets
    ))
}

/// 记录每次调用的伪翻译服务
#[derive(Clone, Default)]
pub struct CountingProvider {
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl CountingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// (目标语言, 原文)
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls().into_iter().map(|(_, text)| text).collect()
    }
}

#[async_trait]
impl TranslationProvider for CountingProvider {
    async fn translate(
        &self,
        text: &str,
        _source: &str,
        target: &str,
        _options: &TranslateOptions,
    ) -> Result<String, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((target.to_string(), text.to_string()));
        Ok(format!("[{}] {}", target, text))
    }
}

/// 原文转大写，输出中不含需要转义的字符
#[derive(Clone, Default)]
pub struct UppercaseProvider;

#[async_trait]
impl TranslationProvider for UppercaseProvider {
    async fn translate(
        &self,
        text: &str,
        _source: &str,
        _target: &str,
        _options: &TranslateOptions,
    ) -> Result<String, ProviderError> {
        Ok(text.to_uppercase())
    }
}

/// 遇到指定原文时返回给定状态码
#[derive(Clone)]
pub struct FailingProvider {
    pub status: u16,
    pub fail_on: String,
}

#[async_trait]
impl TranslationProvider for FailingProvider {
    async fn translate(
        &self,
        text: &str,
        _source: &str,
        target: &str,
        _options: &TranslateOptions,
    ) -> Result<String, ProviderError> {
        if text == self.fail_on {
            return Err(ProviderError::new(Some(self.status), format!("HTTP {}", self.status)));
        }
        Ok(format!("[{}] {}", target, text))
    }
}
