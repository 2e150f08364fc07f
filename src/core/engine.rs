// ============================================================================
// Lara - 翻译引擎
// ============================================================================
//
// 文件: src/core/engine.rs
// 职责: 对每个源文件和目标语言决定键级动作并写回目标文件
// 边界:
//   - ✅ 包含路径展开、排除过滤、命令行路径过滤
//   - ✅ 每个键的 忽略 / 锁定 / 翻译 / 复制 / 保留 决策
//   - ✅ 致命错误立即终止，文件级错误记录后继续
//   - ✅ 按需创建目标目录
//   - ❌ 不应包含格式解析细节
//   - ❌ 不应包含终端输出（进度条除外）
//   - ❌ 不应并发调用翻译服务
//
// ============================================================================

use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::checksum::ChecksumTracker;
use super::key_rules::KeyRules;
use super::provider::{TranslateOptions, TranslationProvider};
use crate::error::{LaraError, Result};
use crate::models::config::ProjectConfig;
use crate::models::translation::{ChangeSet, ChangeState, FlatMap};
use crate::parsers::{FormatParser, FormattingHints, ParseOptions, ParserFactory, SerializeContext};
use crate::ui::progress::TranslateProgress;
use crate::utils::locale::{is_excluded, resolve_include, ResolvedPath};

/// 单次运行的选项
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// 忽略已有译文，全部重新翻译
    pub force: bool,
    /// 只处理这些目标语言（为空时处理全部）
    pub locales: Vec<String>,
    /// 只处理这些路径（为空时处理全部）
    pub paths: Vec<String>,
}

/// 键级动作计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyCounts {
    pub translated: usize,
    pub copied: usize,
    pub kept: usize,
    pub removed: usize,
}

impl KeyCounts {
    fn add(&mut self, other: &KeyCounts) {
        self.translated += other.translated;
        self.copied += other.copied;
        self.kept += other.kept;
        self.removed += other.removed;
    }
}

/// 单个文件 / 语言组合的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// 目标文件已写入
    Written,
    /// 目标文件内容无变化
    Unchanged,
    /// 处理失败
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub source: String,
    pub target: Option<String>,
    pub locale: Option<String>,
    pub counts: KeyCounts,
    pub status: OutcomeStatus,
}

impl FileOutcome {
    fn failed(source: &str, target: Option<&str>, locale: Option<&str>, error: &LaraError) -> Self {
        Self {
            source: source.to_string(),
            target: target.map(str::to_string),
            locale: locale.map(str::to_string),
            counts: KeyCounts::default(),
            status: OutcomeStatus::Failed(error.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed(_))
    }

    /// 出错时展示的路径
    pub fn display_path(&self) -> &str {
        self.target.as_deref().unwrap_or(&self.source)
    }
}

/// 一次运行的汇总
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub outcomes: Vec<FileOutcome>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Written)
            .count()
    }

    pub fn unchanged(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Unchanged)
            .count()
    }

    pub fn totals(&self) -> KeyCounts {
        let mut totals = KeyCounts::default();
        for outcome in &self.outcomes {
            totals.add(&outcome.counts);
        }
        totals
    }
}

/// 一个待处理的源文件
#[derive(Debug, Clone)]
struct FileJob {
    resolved: ResolvedPath,
    rules: KeyRules,
    options: TranslateOptions,
}

/// 翻译引擎
pub struct TranslationEngine {
    config: ProjectConfig,
    root: PathBuf,
    tracker: ChecksumTracker,
    provider: Box<dyn TranslationProvider>,
    options: EngineOptions,
    progress: TranslateProgress,
}

impl TranslationEngine {
    pub fn new(
        config: ProjectConfig,
        root: impl Into<PathBuf>,
        tracker: ChecksumTracker,
        provider: Box<dyn TranslationProvider>,
    ) -> Self {
        Self {
            config,
            root: root.into(),
            tracker,
            provider,
            options: EngineOptions::default(),
            progress: TranslateProgress::hidden(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, progress: TranslateProgress) -> Self {
        self.progress = progress;
        self
    }

    fn source_locale(&self) -> &str {
        &self.config.locales.source
    }

    fn target_locales(&self) -> Vec<String> {
        self.config
            .locales
            .target
            .iter()
            .filter(|l| self.options.locales.is_empty() || self.options.locales.contains(l))
            .cloned()
            .collect()
    }

    /// 命令行路径过滤：模板、源路径相等，或源路径位于给定目录下
    fn selected(&self, resolved: &ResolvedPath) -> bool {
        if self.options.paths.is_empty() {
            return true;
        }
        self.options.paths.iter().any(|filter| {
            let filter = filter.trim_start_matches("./").trim_end_matches('/');
            resolved.template == filter
                || resolved.source == filter
                || resolved.source.starts_with(&format!("{}/", filter))
        })
    }

    fn collect_jobs(&self) -> Result<Vec<FileJob>> {
        let source = self.source_locale();
        let mut seen = HashSet::new();
        let mut jobs = Vec::new();

        for (file_type, file_config) in &self.config.files {
            let rules = KeyRules::from_config(file_config)?;
            let options = TranslateOptions {
                instructions: self.config.instructions_for(file_type),
            };
            for include in &file_config.include {
                for resolved in resolve_include(&self.root, include, source)? {
                    if is_excluded(&resolved.source, &file_config.exclude, source) {
                        tracing::debug!("Excluded {}", resolved.source);
                        continue;
                    }
                    if !self.selected(&resolved) || !seen.insert(resolved.source.clone()) {
                        continue;
                    }
                    jobs.push(FileJob {
                        resolved,
                        rules: rules.clone(),
                        options: options.clone(),
                    });
                }
            }
        }
        Ok(jobs)
    }

    /// 处理所有配置的文件，致命错误时返回 Err
    pub async fn run(&mut self) -> Result<RunReport> {
        let started = Instant::now();
        let jobs = self.collect_jobs()?;

        // 只处理部分目标语言时账本保持不动，其余语言下次仍能看到变更
        let partial = self.target_locales().len() < self.config.locales.target.len();
        if partial {
            tracing::debug!("Locale filter active, checksum ledger will not be updated");
        }
        self.tracker.set_persist(!partial);

        tracing::debug!("Resolved {} source files", jobs.len());

        let mut outcomes = Vec::new();
        for job in &jobs {
            outcomes.extend(self.process_source(job).await?);
        }

        Ok(RunReport {
            outcomes,
            elapsed: started.elapsed(),
        })
    }

    async fn process_source(&mut self, job: &FileJob) -> Result<Vec<FileOutcome>> {
        let source = job.resolved.source.clone();
        let source_path = self.root.join(&source);
        if !source_path.is_file() {
            let error = LaraError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("source file {} not found", source),
            ));
            return Ok(vec![FileOutcome::failed(&source, None, None, &error)]);
        }

        let factory = match ParserFactory::new(&source) {
            Ok(factory) => factory,
            Err(e) => return Ok(vec![FileOutcome::failed(&source, None, None, &e)]),
        };
        let parser = factory.parser();
        let multi = job.resolved.is_multi_locale();
        if multi && !parser.supports_locale_blocks() {
            let error = LaraError::Config(format!(
                "include path {} needs a [locale] placeholder: {} files hold a single locale",
                job.resolved.template,
                parser.name()
            ));
            return Ok(vec![FileOutcome::failed(&source, None, None, &error)]);
        }
        let source_locale = self.config.locales.source.clone();
        let parse_locale = multi.then_some(source_locale.as_str());

        let records = match self
            .tracker
            .calculate_checksum(&source_path, parser, parse_locale)
        {
            Ok(records) => records,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => return Ok(vec![FileOutcome::failed(&source, None, None, &e)]),
        };
        let source_content = match tokio::fs::read_to_string(&source_path).await {
            Ok(content) => content,
            Err(e) => return Ok(vec![FileOutcome::failed(&source, None, None, &e.into())]),
        };

        let mut outcomes = Vec::new();
        for locale in self.target_locales() {
            let target = job.resolved.target(&locale);
            let label = format!("{} → {}", source, target);
            let bar = self.progress.start(&label);

            let result = self
                .translate_locale(job, parser, &records, &source_content, &target, &locale)
                .await;
            match result {
                Ok(outcome) => {
                    if outcome.status == OutcomeStatus::Written {
                        self.progress.finish_ok(&bar, &label);
                    } else {
                        self.progress.finish_unchanged(&bar, &label);
                    }
                    outcomes.push(outcome);
                }
                Err(e) => {
                    self.progress.finish_failed(&bar, &label);
                    if e.is_fatal() {
                        return Err(e);
                    }
                    tracing::debug!("{} failed: {}", target, e);
                    outcomes.push(FileOutcome::failed(&source, Some(&target), Some(&locale), &e));
                }
            }
        }
        Ok(outcomes)
    }

    async fn translate_locale(
        &self,
        job: &FileJob,
        parser: &dyn FormatParser,
        records: &ChangeSet,
        source_content: &str,
        target: &str,
        locale: &str,
    ) -> Result<FileOutcome> {
        let target_path = self.root.join(target);
        let existing = read_optional(&target_path).await?;
        let multi = job.resolved.is_multi_locale();
        let parse_locale = multi.then_some(locale);

        let target_flat = match &existing {
            Some(content) => parser.parse(content, &ParseOptions::target(parse_locale))?,
            None => FlatMap::new(),
        };

        let mut merged = FlatMap::new();
        let mut counts = KeyCounts::default();
        for (key, record) in records {
            if record.state == ChangeState::Deleted {
                continue;
            }
            let display = parser.display_key(key);
            if job.rules.is_ignored(&display) {
                continue;
            }
            if job.rules.is_locked(&display) {
                merged.insert(key.clone(), record.value.clone());
                counts.copied += 1;
                continue;
            }

            let current = target_flat.get(key);
            let needs_translation = match (current, record.state) {
                (None, _) => true,
                _ if self.options.force => true,
                (Some(_), ChangeState::Unchanged | ChangeState::New) => false,
                (Some(_), _) => true,
            };

            let value = match current {
                Some(value) if !needs_translation => {
                    counts.kept += 1;
                    value.clone()
                }
                _ => match &record.value {
                    Value::String(text) if !text.trim().is_empty() => {
                        counts.translated += 1;
                        let translated = self
                            .provider
                            .translate(text, self.source_locale(), locale, &job.options)
                            .await?;
                        Value::String(translated)
                    }
                    other => {
                        counts.copied += 1;
                        other.clone()
                    }
                },
            };
            merged.insert(key.clone(), value);
        }
        counts.removed = target_flat.keys().filter(|k| !merged.contains_key(*k)).count();

        // 内容相同时不重写，PO 头部日期等生成字段保持不变
        let status = if existing.is_some() && merged == target_flat {
            OutcomeStatus::Unchanged
        } else {
            let hints = FormattingHints::detect(existing.as_deref().unwrap_or(source_content));
            let original = existing.clone().unwrap_or_else(|| parser.fallback());
            let context = SerializeContext::new(original)
                .with_source(source_content)
                .with_locale(parse_locale)
                .with_language(locale)
                .with_hints(hints);
            let content = parser.serialize(&merged, &context)?;

            if existing.as_deref() == Some(content.as_str()) {
                OutcomeStatus::Unchanged
            } else {
                write_file(&target_path, &content).await?;
                OutcomeStatus::Written
            }
        };
        tracing::debug!(
            "{}: {} translated, {} copied, {} kept, {} removed",
            target,
            counts.translated,
            counts.copied,
            counts.kept,
            counts.removed
        );

        Ok(FileOutcome {
            source: job.resolved.source.clone(),
            target: Some(target.to_string()),
            locale: Some(locale.to_string()),
            counts,
            status,
        })
    }
}

/// 文件不存在时返回 None
async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::checksum::MemoryLedgerStore;
    use crate::core::provider::PseudoProvider;
    use crate::models::config::FileTypeConfig;

    fn engine(root: &Path, include: &str) -> TranslationEngine {
        let mut config = ProjectConfig::new("en", vec!["it".to_string()]);
        config.files.insert(
            "json".to_string(),
            FileTypeConfig {
                include: vec![include.to_string()],
                ..Default::default()
            },
        );
        TranslationEngine::new(
            config,
            root,
            ChecksumTracker::new(MemoryLedgerStore::new()).with_base_dir(root),
            Box::new(PseudoProvider),
        )
    }

    #[test]
    fn test_path_filter() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine(dir.path(), "locales/[locale].json");
        let resolved = ResolvedPath {
            template: "locales/[locale].json".to_string(),
            source: "locales/en.json".to_string(),
        };
        assert!(engine.selected(&resolved));

        engine.options.paths = vec!["./locales/".to_string()];
        assert!(engine.selected(&resolved));
        engine.options.paths = vec!["locales/[locale].json".to_string()];
        assert!(engine.selected(&resolved));
        engine.options.paths = vec!["docs".to_string()];
        assert!(!engine.selected(&resolved));
    }

    #[test]
    fn test_locale_filter() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine(dir.path(), "[locale].json");
        engine.config.locales.target = vec!["it".to_string(), "fr".to_string()];
        assert_eq!(engine.target_locales(), vec!["it", "fr"]);
        engine.options.locales = vec!["fr".to_string(), "de".to_string()];
        assert_eq!(engine.target_locales(), vec!["fr"]);
    }

    #[tokio::test]
    async fn test_missing_source_is_file_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine(dir.path(), "locales/[locale].json");
        let report = engine.run().await.unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert!(report.has_failures());
        assert_eq!(report.outcomes[0].display_path(), "locales/en.json");
    }

    #[tokio::test]
    async fn test_single_locale_format_needs_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("i18n")).unwrap();
        std::fs::write(dir.path().join("i18n/messages.json"), r#"{"a":"Hello"}"#).unwrap();

        let mut engine = engine(dir.path(), "i18n/messages.json").with_options(EngineOptions {
            force: true,
            ..Default::default()
        });
        let report = engine.run().await.unwrap();
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        match &failures[0].status {
            OutcomeStatus::Failed(message) => assert!(message.contains("[locale]")),
            other => panic!("unexpected status {:?}", other),
        }
        assert_eq!(
            std::fs::read_to_string(dir.path().join("i18n/messages.json")).unwrap(),
            r#"{"a":"Hello"}"#
        );
    }

    #[tokio::test]
    async fn test_writes_target_and_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("locales/en")).unwrap();
        std::fs::write(
            dir.path().join("locales/en/app.json"),
            "{\n    \"title\": \"Hello\",\n    \"count\": 3,\n    \"empty\": \"\"\n}\n",
        )
        .unwrap();

        let mut engine = engine(dir.path(), "locales/[locale]/*.json");
        let report = engine.run().await.unwrap();
        assert!(!report.has_failures());
        assert_eq!(report.written(), 1);
        assert_eq!(
            report.totals(),
            KeyCounts {
                translated: 1,
                copied: 2,
                kept: 0,
                removed: 0
            }
        );

        let written = std::fs::read_to_string(dir.path().join("locales/it/app.json")).unwrap();
        assert_eq!(
            written,
            "{\n    \"title\": \"[it] Hello\",\n    \"count\": 3,\n    \"empty\": \"\"\n}\n"
        );
    }
}
