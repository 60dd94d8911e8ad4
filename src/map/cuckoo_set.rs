//! Cuckoo哈希集合核心实现

use crate::{
    error::CuckooError,
    hash::{build_strategy, HashAlgorithm, HashStrategy},
    map::{
        rehash::{rebuild, BackoffPolicy, RehashGate, RehashState},
        table::Table,
        DEFAULT_CONFIG,
    },
    stats::{
        OperationStatsSnapshot, RehashAccumulatedSnapshot, RehashSnapshot, StatsRecorder,
        StatsRecorderFactory,
    },
    types::{InsertOutcome, OperationType},
    version::{GenerationGuard, GenerationTracker},
};
use parking_lot::RwLock;
use std::{
    fmt,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

/// 集合配置
#[derive(Clone, Debug, PartialEq)]
pub struct CuckooSetConfig {
    /// 初始每侧槽位数
    pub initial_capacity: usize,
    /// 单次踢出预算 = kick_budget_factor * 每侧槽位数
    pub kick_budget_factor: usize,
    /// 负载因子达到该值时扩容，新表发布前必须低于该值
    pub rehash_load_factor: f64,
    /// 踢出失败后的最大重试次数
    pub max_insert_retries: usize,
    /// 等待扩容的首次退避时长
    pub initial_backoff: Duration,
    /// 单次退避上限
    pub max_backoff: Duration,
    /// 放弃等待前的最大等待次数
    pub max_wait_attempts: u32,
    /// 单次扩容最多翻倍重建的次数
    pub max_rehash_doublings: u32,
    pub hash_algorithm: HashAlgorithm,
}

impl Default for CuckooSetConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            kick_budget_factor: 2,
            rehash_load_factor: 0.5,
            max_insert_retries: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(128),
            max_wait_attempts: 64,
            max_rehash_doublings: 32,
            hash_algorithm: HashAlgorithm::default(),
        }
    }
}

impl CuckooSetConfig {
    /// 校验配置
    pub fn validate(&self) -> Result<(), CuckooError> {
        let reason = if self.initial_capacity == 0 {
            "initial_capacity 必须大于0"
        } else if self.kick_budget_factor == 0 {
            "kick_budget_factor 必须大于0"
        } else if !(self.rehash_load_factor > 0.0 && self.rehash_load_factor <= 1.0) {
            "rehash_load_factor 必须在 (0, 1] 范围内"
        } else if self.max_insert_retries == 0 {
            "max_insert_retries 必须大于0"
        } else if self.initial_backoff.is_zero() || self.initial_backoff > self.max_backoff {
            "initial_backoff 必须大于0且不超过 max_backoff"
        } else if self.max_wait_attempts == 0 {
            "max_wait_attempts 必须大于0"
        } else if self.max_rehash_doublings == 0 {
            "max_rehash_doublings 必须大于0"
        } else {
            return Ok(());
        };
        Err(CuckooError::InvalidConfig {
            reason: reason.to_string(),
        })
    }

    /// 等待扩容的退避策略
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial: self.initial_backoff,
            max: self.max_backoff,
            max_attempts: self.max_wait_attempts,
        }
    }
}

/// 集合统计信息
#[derive(Debug, Clone)]
pub struct CuckooSetStats {
    pub size: usize,
    pub capacity: usize,
    pub count: usize,
    pub load_factor: f64,
    pub generation: u64,
    pub rehash_state: RehashState,
    pub operations: OperationStatsSnapshot,
    pub rehash: RehashAccumulatedSnapshot,
}

/// 线程安全的Cuckoo哈希集合
///
/// 写操作 (插入的踢出阶段、删除、发布新表) 持有表写锁；`contains` 与统计只取读锁，
/// 从不等待扩容闸门。扩容在私有新表上离线完成，仅在发布时短暂持有写锁。
pub struct CuckooSet {
    table: RwLock<Table>,
    gate: RehashGate,
    generations: GenerationTracker,
    config: CuckooSetConfig,
    hasher: Arc<dyn HashStrategy>,
    stats_recorder: Arc<dyn StatsRecorder>,
}

impl CuckooSet {
    /// 使用默认配置创建集合，`initial_size` 为0时按1处理
    pub fn new(initial_size: usize) -> Self {
        let config = CuckooSetConfig {
            initial_capacity: initial_size.max(1),
            ..DEFAULT_CONFIG.clone()
        };
        let hasher = build_strategy(config.hash_algorithm);
        Self {
            table: RwLock::new(Table::new(
                config.initial_capacity,
                config.kick_budget_factor,
                Arc::clone(&hasher),
            )),
            gate: RehashGate::new(),
            generations: GenerationTracker::new(),
            config,
            hasher,
            stats_recorder: StatsRecorderFactory::create_default(),
        }
    }

    /// 使用指定配置创建集合
    pub fn with_config(config: CuckooSetConfig) -> Result<Self, CuckooError> {
        let hasher = build_strategy(config.hash_algorithm);
        Self::with_parts(config, hasher, StatsRecorderFactory::create_default())
    }

    /// 使用指定配置、哈希策略与统计记录器创建集合
    pub fn with_parts(
        config: CuckooSetConfig,
        hasher: Arc<dyn HashStrategy>,
        stats_recorder: Arc<dyn StatsRecorder>,
    ) -> Result<Self, CuckooError> {
        config.validate()?;
        let table = Table::try_new(
            config.initial_capacity,
            config.kick_budget_factor,
            Arc::clone(&hasher),
        )?;
        Ok(Self {
            table: RwLock::new(table),
            gate: RehashGate::new(),
            generations: GenerationTracker::new(),
            config,
            hasher,
            stats_recorder,
        })
    }

    pub fn config(&self) -> &CuckooSetConfig {
        &self.config
    }

    /// 插入键；键已存在也返回 `true`，重试耗尽返回 `false`
    pub fn insert(&self, key: &str) -> bool {
        match self.try_insert(key) {
            Ok(_) => true,
            Err(err) => {
                log_warn!("worker {:?} insert {:?} failed: {}", thread::current().id(), key, err);
                false
            }
        }
    }

    /// 插入键并返回详细结果
    ///
    /// 扩容进行中时先阻塞等待；负载因子达到阈值或踢出失败时触发扩容后重试，
    /// 踢出失败累计 `max_insert_retries` 次后返回 `InsertRetriesExhausted`。
    pub fn try_insert(&self, key: &str) -> Result<InsertOutcome, CuckooError> {
        let policy = self.config.backoff_policy();
        let mut failures = 0;

        loop {
            self.gate.wait_idle(&policy)?;

            let observed = {
                let mut table = self.table.write();
                // 扩容一旦开始快照，旧表上不再接受写入
                if self.gate.is_active() {
                    continue;
                }
                if table.contains(key) {
                    self.stats_recorder
                        .record_operation(OperationType::DuplicateInsert);
                    return Ok(InsertOutcome::AlreadyPresent);
                }
                if table.load_factor() < self.config.rehash_load_factor {
                    match table.displace(key) {
                        Ok(report) => {
                            self.stats_recorder.record_operation(OperationType::Insert);
                            self.stats_recorder
                                .operation_stats()
                                .record(OperationType::Kick, report.kicks as u64);
                            return Ok(InsertOutcome::Inserted);
                        }
                        Err(err) => {
                            failures += 1;
                            self.stats_recorder.record_operation(OperationType::Rollback);
                            log_debug!(
                                "worker {:?} insert {:?} attempt {} failed: {}",
                                thread::current().id(),
                                key,
                                failures,
                                err
                            );
                        }
                    }
                }
                self.generations.begin_operation()
            };

            self.rehash(&observed)?;

            if failures >= self.config.max_insert_retries {
                self.stats_recorder.record_operation(OperationType::FailedInsert);
                return Err(CuckooError::InsertRetriesExhausted {
                    key: key.to_owned(),
                    attempts: failures,
                });
            }
        }
    }

    /// 检查键是否存在
    ///
    /// 只取读锁，不等待扩容：扩容期间读到的是最近一次发布的表。
    pub fn contains(&self, key: &str) -> bool {
        let hit = self.table.read().contains(key);
        self.stats_recorder.record_operation(if hit {
            OperationType::ContainsHit
        } else {
            OperationType::ContainsMiss
        });
        hit
    }

    /// 删除键，键存在并被删除时返回 `true`
    pub fn remove(&self, key: &str) -> bool {
        self.try_remove(key).unwrap_or_else(|err| {
            log_warn!("worker {:?} remove {:?} failed: {}", thread::current().id(), key, err);
            false
        })
    }

    /// 删除键并返回详细结果
    pub fn try_remove(&self, key: &str) -> Result<bool, CuckooError> {
        let policy = self.config.backoff_policy();
        loop {
            self.gate.wait_idle(&policy)?;
            let mut table = self.table.write();
            if self.gate.is_active() {
                continue;
            }
            let removed = table.remove(key);
            if removed {
                self.stats_recorder.record_operation(OperationType::Remove);
            }
            return Ok(removed);
        }
    }

    /// 立即执行一次扩容，返回是否由本线程发布了新表
    pub fn force_rehash(&self) -> Result<bool, CuckooError> {
        let observed = self.generations.begin_operation();
        self.rehash(&observed)
    }

    /// 扩容: 快照 -> 离线重建 -> 发布
    ///
    /// 同一时刻只有一个线程能拿到扩容令牌；其他请求者等待其完成后返回 `false`。
    /// `observed` 之后若已有新表发布，说明别的线程已经完成扩容，同样直接返回。
    fn rehash(&self, observed: &GenerationGuard) -> Result<bool, CuckooError> {
        let thread_id = thread::current().id();
        let rehash_stats = self.stats_recorder.rehash_stats();

        let token = match self.gate.try_begin() {
            Some(token) => token,
            None => {
                log_debug!("worker {:?} rehash already in progress, waiting", thread_id);
                self.gate.wait_idle(&self.config.backoff_policy())?;
                rehash_stats.record_skip();
                return Ok(false);
            }
        };
        if !self.generations.is_current(observed) {
            log_debug!("worker {:?} table already republished, skipping rehash", thread_id);
            rehash_stats.record_skip();
            return Ok(false);
        }

        let started = Instant::now();
        rehash_stats.start_rehash();

        let (keys, prior_size) = {
            let table = self.table.read();
            (table.keys(), table.size())
        };
        log_info!(
            "worker {:?} starting rehash: {} keys, size {}",
            thread_id,
            keys.len(),
            prior_size
        );

        token.advance(RehashState::Rebuilding);
        let rebuilt = match rebuild(&keys, prior_size, &self.config, &self.hasher) {
            Ok(rebuilt) => rebuilt,
            Err(err) => {
                rehash_stats.record_failure();
                log_error!("worker {:?} rehash failed: {}", thread_id, err);
                return Err(err);
            }
        };

        token.advance(RehashState::Publishing);
        let new_size = rebuilt.table.size();
        let retired = {
            let mut table = self.table.write();
            debug_assert_eq!(table.count(), keys.len());
            let retired = std::mem::replace(&mut *table, rebuilt.table);
            self.generations.advance();
            retired
        };
        drop(retired);
        drop(token);

        rehash_stats.record_rehash(RehashSnapshot {
            moved_keys: keys.len() as u64,
            rebuild_attempts: u64::from(rebuilt.attempts),
            new_size: new_size as u64,
            duration: started.elapsed(),
        });
        log_info!(
            "worker {:?} rehash completed: size {} -> {} after {} attempt(s), generation {}",
            thread_id,
            prior_size,
            new_size,
            rebuilt.attempts,
            self.generations.current()
        );
        Ok(true)
    }

    /// 当前负载因子
    pub fn load_factor(&self) -> f64 {
        self.table.read().load_factor()
    }

    /// 每侧槽位数 (总容量为其两倍)
    pub fn size(&self) -> usize {
        self.table.read().size()
    }

    /// 总容量
    pub fn capacity(&self) -> usize {
        self.table.read().capacity()
    }

    /// 驻留键数量
    pub fn count(&self) -> usize {
        self.table.read().count()
    }

    pub fn len(&self) -> usize {
        self.count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// 所有驻留键的快照
    pub fn keys(&self) -> Vec<String> {
        self.table.read().keys()
    }

    /// 已发布的代数
    pub fn generation(&self) -> u64 {
        self.generations.current()
    }

    pub fn rehash_state(&self) -> RehashState {
        self.gate.state()
    }

    /// 在读锁下只读访问当前表
    pub fn with_table<R>(&self, f: impl FnOnce(&Table) -> R) -> R {
        f(&self.table.read())
    }

    /// 校验不变式: 计数与直接扫描一致，且所有键位于各自哈希位置
    pub fn check_invariants(&self) -> bool {
        let table = self.table.read();
        table.scan_count() == table.count() && table.positions_consistent()
    }

    /// 获取统计信息
    pub fn stats(&self) -> CuckooSetStats {
        let (size, capacity, count, load_factor) = {
            let table = self.table.read();
            (table.size(), table.capacity(), table.count(), table.load_factor())
        };
        CuckooSetStats {
            size,
            capacity,
            count,
            load_factor,
            generation: self.generations.current(),
            rehash_state: self.gate.state(),
            operations: self.stats_recorder.operation_stats_snapshot(),
            rehash: self.stats_recorder.rehash_stats_snapshot(),
        }
    }

    /// 导出Prometheus格式指标
    pub fn export_prometheus(&self) -> String {
        let stats = self.stats();
        let mut output = self.stats_recorder.export_prometheus();

        output.push_str("# HELP cuckoo_size Slots per array\n");
        output.push_str("# TYPE cuckoo_size gauge\n");
        output.push_str(&format!("cuckoo_size {}\n", stats.size));

        output.push_str("# HELP cuckoo_count Resident keys\n");
        output.push_str("# TYPE cuckoo_count gauge\n");
        output.push_str(&format!("cuckoo_count {}\n", stats.count));

        output.push_str("# HELP cuckoo_load_factor Resident keys divided by total capacity\n");
        output.push_str("# TYPE cuckoo_load_factor gauge\n");
        output.push_str(&format!("cuckoo_load_factor {:.4}\n", stats.load_factor));

        output.push_str("# HELP cuckoo_generation Published table generation\n");
        output.push_str("# TYPE cuckoo_generation counter\n");
        output.push_str(&format!("cuckoo_generation {}\n", stats.generation));

        output
    }
}

impl Default for CuckooSet {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG.initial_capacity)
    }
}

impl fmt::Debug for CuckooSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.read();
        f.debug_struct("CuckooSet")
            .field("size", &table.size())
            .field("count", &table.count())
            .field("load_factor", &table.load_factor())
            .field("generation", &self.generations.current())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{hash::DoubleHashStrategy, stats::DisabledStatsRecorder, types::TableSide};
    use std::thread;

    fn fruits() -> Vec<&'static str> {
        vec!["apple", "banana", "orange", "grape", "mango"]
    }

    #[test]
    fn test_insert_and_contains() {
        let set = CuckooSet::new(4);
        assert!(set.is_empty());
        assert!(set.insert("apple"));
        assert!(set.contains("apple"));
        assert!(!set.contains("banana"));
        assert_eq!(set.count(), 1);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let set = CuckooSet::new(4);
        assert_eq!(set.try_insert("apple"), Ok(InsertOutcome::Inserted));
        assert_eq!(set.try_insert("apple"), Ok(InsertOutcome::AlreadyPresent));
        assert_eq!(set.count(), 1);
        assert_eq!(set.stats().operations.duplicate_insert_count, 1);
    }

    #[test]
    fn test_remove() {
        let set = CuckooSet::new(4);
        set.insert("apple");
        assert!(set.remove("apple"));
        assert!(!set.contains("apple"));
        assert!(!set.remove("apple"));
        assert_eq!(set.count(), 0);
    }

    #[test]
    fn test_fruit_scenario_grows() {
        let set = CuckooSet::new(4);
        for fruit in fruits() {
            assert!(set.insert(fruit), "插入 {} 失败", fruit);
        }
        for fruit in fruits() {
            assert!(set.contains(fruit), "{} 应存在", fruit);
        }
        assert_eq!(set.count(), 5);
        assert!(set.size() >= 8, "至少应扩容一次");
        assert!(set.generation() >= 1);
        assert!(set.load_factor() < 0.5);
        assert!(set.check_invariants());
    }

    #[test]
    fn test_three_keys_never_fail_at_size_four() {
        let set = CuckooSet::new(4);
        for key in ["a", "b", "c"] {
            assert_eq!(set.try_insert(key), Ok(InsertOutcome::Inserted));
        }
        assert_eq!(set.count(), 3);
        assert!(set.load_factor() < 0.5);
    }

    #[test]
    fn test_load_factor_trigger() {
        // 按第二个字符定位，k1..k4 各占A侧一个槽位
        let hasher: Arc<dyn HashStrategy> = Arc::new(DoubleHashStrategy::from_functions(
            |data| u64::from(data[1]),
            |data| u64::from(data[1]) + 1,
        ));
        let config = CuckooSetConfig {
            initial_capacity: 4,
            ..CuckooSetConfig::default()
        };
        let set = CuckooSet::with_parts(config, hasher, StatsRecorderFactory::create_default())
            .unwrap();
        for key in ["k1", "k2", "k3", "k4"] {
            assert!(set.insert(key));
        }
        // 4 / 8 = 0.5，下一次插入前先扩容
        assert_eq!(set.size(), 4);
        assert_eq!(set.load_factor(), 0.5);
        set.insert("k5");
        assert_eq!(set.size(), 8);
        assert_eq!(set.stats().rehash.completed, 1);
    }

    #[test]
    fn test_force_rehash_preserves_keys() {
        let set = CuckooSet::new(8);
        for fruit in fruits() {
            set.insert(fruit);
        }
        let before = set.generation();
        assert_eq!(set.force_rehash(), Ok(true));
        assert_eq!(set.generation(), before + 1);
        assert_eq!(set.rehash_state(), RehashState::Idle);
        for fruit in fruits() {
            assert!(set.contains(fruit));
        }
        assert!(set.check_invariants());
    }

    #[test]
    fn test_collision_triggers_rehash() {
        // 大小为4和8时三个键在两侧都落在同一下标，大小为16时b与a/c分开
        let hasher: Arc<dyn HashStrategy> = Arc::new(DoubleHashStrategy::from_functions(
            |data| data.len() as u64 * 4 + u64::from(data[0] % 2) * 8,
            |data| data.len() as u64 * 4,
        ));
        let config = CuckooSetConfig {
            initial_capacity: 4,
            ..CuckooSetConfig::default()
        };
        let set = CuckooSet::with_parts(config, hasher, StatsRecorderFactory::create_default())
            .unwrap();

        assert!(set.insert("a"));
        assert!(set.insert("c"));
        // 第三个键两侧都没有空位，需要两次扩容
        assert!(set.insert("b"));
        assert_eq!(set.size(), 16);
        for key in ["a", "b", "c"] {
            assert!(set.contains(key));
        }

        let stats = set.stats();
        assert_eq!(stats.operations.rollback_count, 2);
        assert_eq!(stats.rehash.completed, 2);
        assert_eq!(stats.operations.insert_count, 3);
    }

    #[test]
    fn test_insert_retries_exhausted() {
        // 所有键在任何大小下都冲突
        let hasher: Arc<dyn HashStrategy> =
            Arc::new(DoubleHashStrategy::from_functions(|_| 0, |_| 0));
        let config = CuckooSetConfig {
            initial_capacity: 4,
            max_rehash_doublings: 2,
            ..CuckooSetConfig::default()
        };
        let set =
            CuckooSet::with_parts(config, hasher, Arc::new(DisabledStatsRecorder)).unwrap();

        assert!(set.insert("x"));
        assert!(set.insert("y"));
        assert!(!set.insert("z"));
        assert!(!set.contains("z"));
        assert_eq!(set.count(), 2);
        set.with_table(|table| {
            assert_eq!(table.slots(TableSide::A).occupied(), 1);
            assert_eq!(table.slots(TableSide::B).occupied(), 1);
        });
    }

    #[test]
    fn test_invalid_config() {
        let config = CuckooSetConfig {
            rehash_load_factor: 1.5,
            ..CuckooSetConfig::default()
        };
        assert!(matches!(
            CuckooSet::with_config(config),
            Err(CuckooError::InvalidConfig { .. })
        ));

        let config = CuckooSetConfig {
            initial_capacity: 0,
            ..CuckooSetConfig::default()
        };
        assert!(CuckooSet::with_config(config).is_err());
    }

    #[test]
    fn test_new_zero_size() {
        let set = CuckooSet::new(0);
        assert_eq!(set.size(), 1);
        assert!(set.insert("only"));
        assert!(set.contains("only"));
    }

    #[test]
    fn test_concurrent_insert() {
        let set = Arc::new(CuckooSet::new(4));
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let set = Arc::clone(&set);
                thread::spawn(move || set.insert(&format!("test{}", i)))
            })
            .collect();
        let succeeded = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(set.count(), succeeded);
        for i in 0..10 {
            let key = format!("test{}", i);
            if set.contains(&key) {
                continue;
            }
            panic!("{} 丢失", key);
        }
        assert!(set.check_invariants());
    }

    #[test]
    fn test_export_prometheus() {
        let set = CuckooSet::new(4);
        set.insert("apple");
        let text = set.export_prometheus();
        assert!(text.contains("cuckoo_count 1"));
        assert!(text.contains("cuckoo_size 4"));
        assert!(text.contains("cuckoo_operations_total{type=\"insert\"} 1"));
    }
}
