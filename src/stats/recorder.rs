// src/stats/recorder.rs
//! 统计记录器接口 - 定义统一统计API

use std::sync::Arc;

use crate::{
    stats::{
        operation::{AtomicOperationStats, DisabledOperationRecorder, OperationRecorder, OperationStatsSnapshot},
        rehash::{DisabledRehashRecorder, RehashAccumulatedSnapshot, RehashRecorder, RehashStats},
    },
    types::OperationType,
};

/// 统计记录器特征
pub trait StatsRecorder: Send + Sync {
    /// 记录一次操作
    fn record_operation(&self, op_type: OperationType) {
        self.operation_stats().record(op_type, 1);
    }

    /// 获取操作统计接口
    fn operation_stats(&self) -> &dyn OperationRecorder;

    /// 获取扩容统计接口
    fn rehash_stats(&self) -> &dyn RehashRecorder;

    /// 重置所有统计
    fn reset(&self) {
        self.operation_stats().reset();
        self.rehash_stats().reset();
    }

    /// 导出Prometheus格式指标
    fn export_prometheus(&self) -> String {
        let mut output = self.operation_stats().export_prometheus();
        output.push_str(&self.rehash_stats().export_prometheus());
        output
    }

    /// 获取操作统计快照
    fn operation_stats_snapshot(&self) -> OperationStatsSnapshot {
        self.operation_stats().snapshot()
    }

    /// 获取扩容统计快照
    fn rehash_stats_snapshot(&self) -> RehashAccumulatedSnapshot {
        self.rehash_stats().snapshot()
    }
}

/// 全局统计记录器实现
#[derive(Debug, Default)]
pub struct GlobalStatsRecorder {
    operation: AtomicOperationStats,
    rehash: RehashStats,
}

impl GlobalStatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatsRecorder for GlobalStatsRecorder {
    fn operation_stats(&self) -> &dyn OperationRecorder {
        &self.operation
    }

    fn rehash_stats(&self) -> &dyn RehashRecorder {
        &self.rehash
    }
}

/// 禁用统计的记录器
#[derive(Debug, Default)]
pub struct DisabledStatsRecorder;

impl StatsRecorder for DisabledStatsRecorder {
    fn operation_stats(&self) -> &dyn OperationRecorder {
        &DisabledOperationRecorder
    }

    fn rehash_stats(&self) -> &dyn RehashRecorder {
        &DisabledRehashRecorder
    }
}

/// 统计记录器工厂
pub struct StatsRecorderFactory;

impl StatsRecorderFactory {
    /// 创建默认记录器
    pub fn create_default() -> Arc<dyn StatsRecorder> {
        Arc::new(GlobalStatsRecorder::new())
    }

    /// 创建禁用统计的记录器
    pub fn create_disabled() -> Arc<dyn StatsRecorder> {
        Arc::new(DisabledStatsRecorder)
    }
}
