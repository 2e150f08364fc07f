// ============================================================================
// Lara - 数据模型
// ============================================================================
//
// 文件: src/models/mod.rs
// 职责: 配置和翻译数据结构入口
// 边界:
//   - ✅ 子模块导出
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

pub mod config;
pub mod translation;

pub use config::{ProjectConfig, RuntimeArgs};
pub use translation::{ChangeRecord, ChangeSet, ChangeState, FlatMap};
