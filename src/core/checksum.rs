// ============================================================================
// Lara - 校验和账本
// ============================================================================
//
// 文件: src/core/checksum.rs
// 职责: 持久化每个源文件的键值哈希快照，计算键级变更状态
// 边界:
//   - ✅ 账本存储抽象（文件 / 内存）
//   - ✅ 账本懒加载并在一次运行内缓存
//   - ✅ 新增 / 更新 / 未变 / 删除 四种状态的判定
//   - ✅ 有变化时整体替换该文件的快照并立即落盘
//   - ❌ 不应决定翻译动作
//   - ❌ 不应协调多个进程对同一账本的并发写入
//
// ============================================================================

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{LaraError, Result};
use crate::models::translation::{ChangeRecord, ChangeSet, ChangeState, FlatMap};
use crate::parsers::{FormatParser, ParseOptions};

/// 账本格式版本
pub const LEDGER_VERSION: &str = "1.0.0";

/// 单个文件的键哈希快照
pub type FileSnapshot = IndexMap<String, String>;

/// 账本内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub version: String,
    #[serde(default)]
    pub files: IndexMap<String, FileSnapshot>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            version: LEDGER_VERSION.to_string(),
            files: IndexMap::new(),
        }
    }
}

/// 文本的 MD5 十六进制摘要
pub fn hash_text(text: &str) -> String {
    format!("{:x}", md5::compute(text.as_bytes()))
}

/// 值哈希：字符串直接取原文，其余取 JSON 文本
pub fn hash_value(value: &Value) -> String {
    match value {
        Value::String(text) => hash_text(text),
        other => hash_text(&other.to_string()),
    }
}

/// 账本存储
pub trait LedgerStore: Send + Sync {
    fn load(&self) -> Result<Ledger>;

    fn save(&self, ledger: &Ledger) -> Result<()>;
}

/// 基于 YAML 文件的账本存储
#[derive(Debug, Clone)]
pub struct FileLedgerStore {
    path: PathBuf,
}

impl FileLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ledger_error(&self, reason: impl ToString) -> LaraError {
        LaraError::Ledger {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl LedgerStore for FileLedgerStore {
    fn load(&self) -> Result<Ledger> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Ledger::default()),
            Err(e) => return Err(self.ledger_error(e)),
        };
        if content.trim().is_empty() {
            return Ok(Ledger::default());
        }
        serde_yaml::from_str(&content).map_err(|e| self.ledger_error(e))
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.ledger_error(e))?;
            }
        }
        let content = serde_yaml::to_string(ledger).map_err(|e| self.ledger_error(e))?;
        std::fs::write(&self.path, content).map_err(|e| self.ledger_error(e))
    }
}

/// 内存账本存储，克隆后共享同一份数据
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    ledger: Ledger,
    saves: usize,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前保存的账本
    pub fn snapshot(&self) -> Ledger {
        self.state
            .lock()
            .map(|state| state.ledger.clone())
            .unwrap_or_default()
    }

    /// 保存次数
    pub fn saves(&self) -> usize {
        self.state.lock().map(|state| state.saves).unwrap_or_default()
    }

    fn poisoned() -> LaraError {
        LaraError::Ledger {
            path: PathBuf::from("<memory>"),
            reason: "ledger lock poisoned".to_string(),
        }
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self) -> Result<Ledger> {
        let state = self.state.lock().map_err(|_| Self::poisoned())?;
        Ok(state.ledger.clone())
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        let mut state = self.state.lock().map_err(|_| Self::poisoned())?;
        state.ledger = ledger.clone();
        state.saves += 1;
        Ok(())
    }
}

/// 变更追踪器
pub struct ChecksumTracker {
    store: Box<dyn LedgerStore>,
    ledger: Option<Ledger>,
    base_dir: Option<PathBuf>,
    persist: bool,
}

impl std::fmt::Debug for ChecksumTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChecksumTracker")
            .field("loaded", &self.ledger.is_some())
            .field("base_dir", &self.base_dir)
            .field("persist", &self.persist)
            .finish()
    }
}

impl ChecksumTracker {
    pub fn new(store: impl LedgerStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            ledger: None,
            base_dir: None,
            persist: true,
        }
    }

    /// 关闭后只做比对，不更新账本
    pub fn set_persist(&mut self, persist: bool) {
        self.persist = persist;
    }

    /// 文件标识取相对此目录的路径，账本不随项目位置变化
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    fn ledger(&mut self) -> Result<&mut Ledger> {
        if self.ledger.is_none() {
            let loaded = self.store.load()?;
            tracing::debug!("Loaded checksum ledger with {} files", loaded.files.len());
            self.ledger = Some(loaded);
        }
        match self.ledger.as_mut() {
            Some(ledger) => Ok(ledger),
            None => Err(LaraError::Ledger {
                path: PathBuf::from("<unloaded>"),
                reason: "ledger not loaded".to_string(),
            }),
        }
    }

    /// 文件在账本中的键
    pub fn file_hash(&self, path: &Path) -> String {
        let relative = self
            .base_dir
            .as_deref()
            .and_then(|base| path.strip_prefix(base).ok())
            .unwrap_or(path);
        let normalized = relative.to_string_lossy().replace('\\', "/");
        hash_text(&normalized)
    }

    /// 读取并解析文件，返回每个键的变更记录
    ///
    /// 文件不可读时返回空表且不触碰账本；解析错误向上传递。
    pub fn calculate_checksum(
        &mut self,
        path: &Path,
        parser: &dyn FormatParser,
        locale: Option<&str>,
    ) -> Result<ChangeSet> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", path.display(), e);
                return Ok(ChangeSet::new());
            }
        };
        let flat = parser.parse(&content, &ParseOptions::source(locale))?;
        let file_hash = self.file_hash(path);
        self.classify(&file_hash, &flat)
    }

    /// 对比已解析的键值与账本快照
    pub fn classify(&mut self, file_hash: &str, flat: &FlatMap) -> Result<ChangeSet> {
        let ledger = self.ledger()?;
        let previous = ledger.files.get(file_hash);

        let mut records = ChangeSet::new();
        let mut snapshot = FileSnapshot::new();
        for (key, value) in flat {
            let hash = hash_value(value);
            let state = match previous.and_then(|p| p.get(key)) {
                None => ChangeState::New,
                Some(old) if *old == hash => ChangeState::Unchanged,
                Some(_) => ChangeState::Updated,
            };
            records.insert(key.clone(), ChangeRecord::new(value.clone(), state));
            snapshot.insert(key.clone(), hash);
        }
        if let Some(previous) = previous {
            for key in previous.keys().filter(|k| !flat.contains_key(*k)) {
                records.insert(key.clone(), ChangeRecord::new(Value::Null, ChangeState::Deleted));
            }
        }

        if self.persist && records.values().any(|r| !r.is_unchanged()) {
            let ledger = self.ledger()?;
            ledger.files.insert(file_hash.to_string(), snapshot);
            let ledger = ledger.clone();
            self.store.save(&ledger)?;
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::json::JsonParser;
    use serde_json::json;

    fn flat(value: Value) -> FlatMap {
        crate::parsers::flatten::flatten_document(&value)
    }

    fn states(records: &ChangeSet) -> Vec<(String, ChangeState)> {
        records
            .iter()
            .map(|(k, r)| (k.clone(), r.state))
            .collect()
    }

    #[test]
    fn test_hashes_are_md5_hex() {
        assert_eq!(hash_text("Hello"), "8b1a9953c4611296a827abf8c47804d7");
        assert_eq!(hash_value(&json!("Hello")), hash_text("Hello"));
        assert_eq!(hash_value(&json!(42)), hash_text("42"));
        assert_eq!(hash_value(&json!(true)), hash_text("true"));
    }

    #[test]
    fn test_classify_lifecycle() {
        let store = MemoryLedgerStore::new();
        let mut tracker = ChecksumTracker::new(store.clone());

        let first = tracker.classify("f", &flat(json!({"a": "Hello", "b": "Bye"}))).unwrap();
        assert_eq!(
            states(&first),
            vec![("a".into(), ChangeState::New), ("b".into(), ChangeState::New)]
        );
        assert_eq!(store.saves(), 1);

        let again = tracker.classify("f", &flat(json!({"a": "Hello", "b": "Bye"}))).unwrap();
        assert!(again.values().all(ChangeRecord::is_unchanged));
        assert_eq!(store.saves(), 1);

        let changed = tracker.classify("f", &flat(json!({"a": "Hi", "c": 1}))).unwrap();
        assert_eq!(
            states(&changed),
            vec![
                ("a".into(), ChangeState::Updated),
                ("c".into(), ChangeState::New),
                ("b".into(), ChangeState::Deleted),
            ]
        );
        assert_eq!(store.saves(), 2);

        let saved = store.snapshot();
        let snapshot = &saved.files["f"];
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["a"], hash_text("Hi"));
    }

    #[test]
    fn test_ledger_is_loaded_once() {
        let store = MemoryLedgerStore::new();
        let mut tracker = ChecksumTracker::new(store.clone());
        tracker.classify("f", &flat(json!({"a": "x"}))).unwrap();

        // 外部修改不影响已缓存的账本
        store.save(&Ledger::default()).unwrap();
        let records = tracker.classify("f", &flat(json!({"a": "x"}))).unwrap();
        assert!(records["a"].is_unchanged());
    }

    #[test]
    fn test_classify_without_persist_keeps_ledger() {
        let store = MemoryLedgerStore::new();
        let mut tracker = ChecksumTracker::new(store.clone());
        tracker.classify("f", &flat(json!({"a": "Hello"}))).unwrap();

        tracker.set_persist(false);
        let records = tracker.classify("f", &flat(json!({"a": "Hi"}))).unwrap();
        assert_eq!(records["a"].state, ChangeState::Updated);
        assert_eq!(store.saves(), 1);
        assert_eq!(store.snapshot().files["f"]["a"], hash_text("Hello"));

        // 再次比对仍报告变更
        tracker.set_persist(true);
        let records = tracker.classify("f", &flat(json!({"a": "Hi"}))).unwrap();
        assert_eq!(records["a"].state, ChangeState::Updated);
        assert_eq!(store.saves(), 2);
    }

    #[test]
    fn test_file_store_round_trip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLedgerStore::new(dir.path().join("lara.lock"));
        assert_eq!(store.load().unwrap(), Ledger::default());

        let mut tracker = ChecksumTracker::new(store.clone());
        tracker.classify("abc", &flat(json!({"a": "Hello"}))).unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("version:"));
        assert!(content.contains("1.0.0"));
        assert!(content.contains(&hash_text("Hello")));
        assert_eq!(store.load().unwrap().files["abc"]["a"], hash_text("Hello"));
    }

    #[test]
    fn test_corrupt_ledger_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lara.lock");
        std::fs::write(&path, "files: [not, a, map").unwrap();
        let mut tracker = ChecksumTracker::new(FileLedgerStore::new(&path));
        let err = tracker.classify("f", &FlatMap::new()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_calculate_checksum_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("en.json");
        std::fs::write(&path, r#"{"a": "Hello", "n": {"b": "Bye"}}"#).unwrap();

        let store = MemoryLedgerStore::new();
        let mut tracker = ChecksumTracker::new(store.clone()).with_base_dir(dir.path());
        let records = tracker
            .calculate_checksum(&path, &JsonParser::new(), None)
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(store.snapshot().files.contains_key(&hash_text("en.json")));

        let missing = tracker
            .calculate_checksum(&dir.path().join("fr.json"), &JsonParser::new(), None)
            .unwrap();
        assert!(missing.is_empty());
        assert_eq!(store.saves(), 1);
    }
}
