// src/stats/operation.rs
//! 操作统计 - 跟踪集合操作次数

use crate::types::OperationType;
use std::sync::atomic::{AtomicU64, Ordering};

/// 操作统计接口
pub trait OperationRecorder: Send + Sync {
    /// 记录 `count` 次操作
    fn record(&self, op_type: OperationType, count: u64);

    /// 获取操作统计快照
    fn snapshot(&self) -> OperationStatsSnapshot;

    /// 重置统计
    fn reset(&self);

    /// 导出Prometheus格式指标
    fn export_prometheus(&self) -> String;
}

/// 操作统计快照
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationStatsSnapshot {
    pub insert_count: u64,
    pub duplicate_insert_count: u64,
    pub failed_insert_count: u64,
    pub remove_count: u64,
    pub contains_hit_count: u64,
    pub contains_miss_count: u64,
    pub kick_count: u64,
    pub rollback_count: u64,
}

impl OperationStatsSnapshot {
    /// 按操作类型读取计数
    pub fn get(&self, op_type: OperationType) -> u64 {
        match op_type {
            OperationType::Insert => self.insert_count,
            OperationType::DuplicateInsert => self.duplicate_insert_count,
            OperationType::FailedInsert => self.failed_insert_count,
            OperationType::Remove => self.remove_count,
            OperationType::ContainsHit => self.contains_hit_count,
            OperationType::ContainsMiss => self.contains_miss_count,
            OperationType::Kick => self.kick_count,
            OperationType::Rollback => self.rollback_count,
        }
    }

    /// 踢出失败率 (回滚次数 / 新插入次数)
    pub fn rollback_rate(&self) -> f64 {
        if self.insert_count == 0 {
            0.0
        } else {
            self.rollback_count as f64 / self.insert_count as f64
        }
    }
}

/// 原子操作统计
#[derive(Debug, Default)]
pub struct AtomicOperationStats {
    insert_count: AtomicU64,
    duplicate_insert_count: AtomicU64,
    failed_insert_count: AtomicU64,
    remove_count: AtomicU64,
    contains_hit_count: AtomicU64,
    contains_miss_count: AtomicU64,
    kick_count: AtomicU64,
    rollback_count: AtomicU64,
}

impl AtomicOperationStats {
    /// 创建新统计
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, op_type: OperationType) -> &AtomicU64 {
        match op_type {
            OperationType::Insert => &self.insert_count,
            OperationType::DuplicateInsert => &self.duplicate_insert_count,
            OperationType::FailedInsert => &self.failed_insert_count,
            OperationType::Remove => &self.remove_count,
            OperationType::ContainsHit => &self.contains_hit_count,
            OperationType::ContainsMiss => &self.contains_miss_count,
            OperationType::Kick => &self.kick_count,
            OperationType::Rollback => &self.rollback_count,
        }
    }
}

impl OperationRecorder for AtomicOperationStats {
    fn record(&self, op_type: OperationType, count: u64) {
        self.counter(op_type).fetch_add(count, Ordering::Relaxed);
    }

    fn snapshot(&self) -> OperationStatsSnapshot {
        OperationStatsSnapshot {
            insert_count: self.insert_count.load(Ordering::Relaxed),
            duplicate_insert_count: self.duplicate_insert_count.load(Ordering::Relaxed),
            failed_insert_count: self.failed_insert_count.load(Ordering::Relaxed),
            remove_count: self.remove_count.load(Ordering::Relaxed),
            contains_hit_count: self.contains_hit_count.load(Ordering::Relaxed),
            contains_miss_count: self.contains_miss_count.load(Ordering::Relaxed),
            kick_count: self.kick_count.load(Ordering::Relaxed),
            rollback_count: self.rollback_count.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        for op in OperationType::ALL {
            self.counter(op).store(0, Ordering::Relaxed);
        }
    }

    fn export_prometheus(&self) -> String {
        let mut output = String::new();
        output.push_str("# HELP cuckoo_operations_total Total operations by type\n");
        output.push_str("# TYPE cuckoo_operations_total counter\n");
        for op in OperationType::ALL {
            output.push_str(&format!(
                "cuckoo_operations_total{{type=\"{}\"}} {}\n",
                op.as_str(),
                self.counter(op).load(Ordering::Relaxed)
            ));
        }
        output
    }
}

/// 禁用操作统计
#[derive(Debug, Default)]
pub struct DisabledOperationRecorder;

impl OperationRecorder for DisabledOperationRecorder {
    fn record(&self, _op_type: OperationType, _count: u64) {}
    fn snapshot(&self) -> OperationStatsSnapshot { OperationStatsSnapshot::default() }
    fn reset(&self) {}
    fn export_prometheus(&self) -> String { String::new() }
}
