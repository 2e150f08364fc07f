// ============================================================================
// Lara - 翻译数据模型
// ============================================================================
//
// 文件: src/models/translation.rs
// 职责: 扁平键值表和变更记录的数据结构定义
// 边界:
//   - ✅ FlatMap 类型定义
//   - ✅ 变更状态和变更记录定义
//   - ❌ 不应包含格式解析逻辑
//   - ❌ 不应包含校验和计算逻辑
//
// ============================================================================

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// 扁平键值表，保持文档顺序
pub type FlatMap = IndexMap<String, Value>;

/// 单个键的变更状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeState {
    /// 账本中不存在
    New,
    /// 值的哈希发生变化
    Updated,
    /// 值的哈希未变
    Unchanged,
    /// 账本中存在但源文件已删除
    Deleted,
}

impl fmt::Display for ChangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeState::New => write!(f, "new"),
            ChangeState::Updated => write!(f, "updated"),
            ChangeState::Unchanged => write!(f, "unchanged"),
            ChangeState::Deleted => write!(f, "deleted"),
        }
    }
}

/// 单个键的变更记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// 当前值（已删除的键为 null）
    pub value: Value,
    /// 变更状态
    pub state: ChangeState,
}

impl ChangeRecord {
    pub fn new(value: Value, state: ChangeState) -> Self {
        Self { value, state }
    }

    pub fn is_unchanged(&self) -> bool {
        self.state == ChangeState::Unchanged
    }
}

/// 按键排列的变更记录表
pub type ChangeSet = IndexMap<String, ChangeRecord>;
