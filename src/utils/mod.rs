// ============================================================================
// Lara - 工具模块
// ============================================================================
//
// 文件: src/utils/mod.rs
// 职责: 通用工具入口
// 边界:
//   - ✅ 颜色、常量、日志、语言路径工具
//   - ❌ 不应包含翻译流程逻辑
//
// ============================================================================

pub mod colors;
pub mod constants;
pub mod locale;
pub mod logger;
