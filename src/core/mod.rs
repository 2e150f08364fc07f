// ============================================================================
// Lara - Core 核心模块
// ============================================================================
//
// 文件: src/core/mod.rs
// 职责: 核心业务逻辑模块入口和导出
// 边界:
//   - ✅ 核心子模块导出
//   - ✅ 常用类型重新导出
//   - ❌ 不应包含具体业务实现
//   - ❌ 不应包含 CLI 相关逻辑
//
// ============================================================================

pub mod checksum;
pub mod engine;
pub mod key_rules;
pub mod provider;

// 重新导出常用类型
pub use checksum::{ChecksumTracker, FileLedgerStore, LedgerStore, MemoryLedgerStore};
pub use engine::{EngineOptions, FileOutcome, OutcomeStatus, RunReport, TranslationEngine};
pub use key_rules::KeyRules;
pub use provider::{build_provider, PseudoProvider, TranslateOptions, TranslationProvider};
