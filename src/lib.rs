// ============================================================================
// Lara - 库入口
// ============================================================================
//
// 文件: src/lib.rs
// 职责: 模块声明和公共类型导出
// 边界:
//   - ✅ 模块树
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

pub mod cli;
pub mod core;
pub mod error;
pub mod i18n;
pub mod models;
pub mod parsers;
pub mod ui;
pub mod utils;

pub use error::{LaraError, ProviderError, Result};
