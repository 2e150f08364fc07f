// ============================================================================
// Lara - UI 模块
// ============================================================================
//
// 文件: src/ui/mod.rs
// 职责: 终端展示组件入口
// 边界:
//   - ✅ 进度显示和结果汇总
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

pub mod progress;
pub mod summary;
