//! 核心类型定义 - 共享类型

use std::fmt;

/// 槽位数组标识 - 每个键在A、B两个数组中各有一个候选位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableSide {
    /// 由主哈希函数寻址的数组
    A,
    /// 由副哈希函数寻址的数组
    B,
}

impl TableSide {
    /// 另一侧数组
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl fmt::Display for TableSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// 插入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// 新插入
    Inserted,
    /// 键已存在，无操作
    AlreadyPresent,
}

/// 操作类型 (用于统计)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    /// 插入操作
    Insert,
    /// 重复插入
    DuplicateInsert,
    /// 插入失败
    FailedInsert,
    /// 删除操作
    Remove,
    /// 查询命中
    ContainsHit,
    /// 查询未命中
    ContainsMiss,
    /// 踢出操作
    Kick,
    /// 回滚操作
    Rollback,
}

impl OperationType {
    /// 所有操作类型，按导出顺序
    pub const ALL: [OperationType; 8] = [
        OperationType::Insert,
        OperationType::DuplicateInsert,
        OperationType::FailedInsert,
        OperationType::Remove,
        OperationType::ContainsHit,
        OperationType::ContainsMiss,
        OperationType::Kick,
        OperationType::Rollback,
    ];

    /// 指标名称
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::DuplicateInsert => "duplicate_insert",
            Self::FailedInsert => "failed_insert",
            Self::Remove => "remove",
            Self::ContainsHit => "contains_hit",
            Self::ContainsMiss => "contains_miss",
            Self::Kick => "kick",
            Self::Rollback => "rollback",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
