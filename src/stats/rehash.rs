//! 扩容统计 - 跟踪重建与发布

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

/// 单次扩容详情
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RehashSnapshot {
    /// 迁移到新表的键数
    pub moved_keys: u64,
    /// 重建尝试次数 (含成功的那一次)
    pub rebuild_attempts: u64,
    /// 发布后的每侧槽位数
    pub new_size: u64,
    pub duration: Duration,
}

/// 扩容统计接口
pub trait RehashRecorder: Send + Sync {
    /// 记录扩容开始
    fn start_rehash(&self);

    /// 记录因其他线程已完成扩容而跳过的请求
    fn record_skip(&self);

    /// 记录扩容完成
    fn record_rehash(&self, stats: RehashSnapshot);

    /// 记录扩容失败
    fn record_failure(&self);

    /// 获取扩容统计快照
    fn snapshot(&self) -> RehashAccumulatedSnapshot;

    /// 重置统计
    fn reset(&self);

    /// 导出Prometheus格式指标
    fn export_prometheus(&self) -> String;
}

/// 累积扩容统计
#[derive(Debug, Default)]
pub struct RehashStats {
    started: AtomicU64,
    completed: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    moved_keys: AtomicU64,
    rebuild_attempts: AtomicU64,
    last_size: AtomicU64,
    duration_sum: AtomicU64, // 纳秒
}

/// 累积统计快照
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RehashAccumulatedSnapshot {
    pub started: u64,
    pub completed: u64,
    pub skipped: u64,
    pub failed: u64,
    pub moved_keys: u64,
    pub rebuild_attempts: u64,
    pub last_size: u64,
    pub duration_sum: Duration,
}

impl RehashStats {
    /// 创建新统计
    pub fn new() -> Self {
        Self::default()
    }
}

impl RehashRecorder for RehashStats {
    fn start_rehash(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    fn record_rehash(&self, stats: RehashSnapshot) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.moved_keys.fetch_add(stats.moved_keys, Ordering::Relaxed);
        self.rebuild_attempts
            .fetch_add(stats.rebuild_attempts, Ordering::Relaxed);
        self.last_size.store(stats.new_size, Ordering::Relaxed);
        self.duration_sum
            .fetch_add(stats.duration.as_nanos() as u64, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> RehashAccumulatedSnapshot {
        RehashAccumulatedSnapshot {
            started: self.started.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            moved_keys: self.moved_keys.load(Ordering::Relaxed),
            rebuild_attempts: self.rebuild_attempts.load(Ordering::Relaxed),
            last_size: self.last_size.load(Ordering::Relaxed),
            duration_sum: Duration::from_nanos(self.duration_sum.load(Ordering::Relaxed)),
        }
    }

    fn reset(&self) {
        self.started.store(0, Ordering::Relaxed);
        self.completed.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.moved_keys.store(0, Ordering::Relaxed);
        self.rebuild_attempts.store(0, Ordering::Relaxed);
        self.last_size.store(0, Ordering::Relaxed);
        self.duration_sum.store(0, Ordering::Relaxed);
    }

    fn export_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let mut output = String::new();

        output.push_str("# HELP cuckoo_rehash_count Completed rehash operations\n");
        output.push_str("# TYPE cuckoo_rehash_count counter\n");
        output.push_str(&format!("cuckoo_rehash_count {}\n", snapshot.completed));

        output.push_str("# HELP cuckoo_rehash_skipped Rehash requests already served by another thread\n");
        output.push_str("# TYPE cuckoo_rehash_skipped counter\n");
        output.push_str(&format!("cuckoo_rehash_skipped {}\n", snapshot.skipped));

        output.push_str("# HELP cuckoo_rehash_failed Rehash operations that gave up\n");
        output.push_str("# TYPE cuckoo_rehash_failed counter\n");
        output.push_str(&format!("cuckoo_rehash_failed {}\n", snapshot.failed));

        output.push_str("# HELP cuckoo_rehash_moved_keys Keys moved into new generations\n");
        output.push_str("# TYPE cuckoo_rehash_moved_keys counter\n");
        output.push_str(&format!("cuckoo_rehash_moved_keys {}\n", snapshot.moved_keys));

        output.push_str("# HELP cuckoo_rehash_rebuild_attempts Scratch table rebuild attempts\n");
        output.push_str("# TYPE cuckoo_rehash_rebuild_attempts counter\n");
        output.push_str(&format!(
            "cuckoo_rehash_rebuild_attempts {}\n",
            snapshot.rebuild_attempts
        ));

        output.push_str("# HELP cuckoo_rehash_duration_total Total rehash duration (seconds)\n");
        output.push_str("# TYPE cuckoo_rehash_duration_total counter\n");
        output.push_str(&format!(
            "cuckoo_rehash_duration_total {:.6}\n",
            snapshot.duration_sum.as_secs_f64()
        ));

        output
    }
}

/// 禁用扩容统计
#[derive(Debug, Default)]
pub struct DisabledRehashRecorder;

impl RehashRecorder for DisabledRehashRecorder {
    fn start_rehash(&self) {}
    fn record_skip(&self) {}
    fn record_rehash(&self, _stats: RehashSnapshot) {}
    fn record_failure(&self) {}
    fn snapshot(&self) -> RehashAccumulatedSnapshot { RehashAccumulatedSnapshot::default() }
    fn reset(&self) {}
    fn export_prometheus(&self) -> String { String::new() }
}
