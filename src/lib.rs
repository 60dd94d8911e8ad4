//! 并发Cuckoo哈希集合
//!
//! 字符串键集合，每个键驻留在两个槽位数组之一，位置由两个独立哈希函数决定。
//!
//! ## 主要特性
//! - 查询最多检查两个槽位
//! - 插入通过踢出链为新键腾位，失败时原样回滚
//! - 负载因子达到阈值或踢出失败时自动扩容，扩容在私有新表上完成后整体发布
//! - 多线程共享，读操作不等待扩容
//! - 操作与扩容统计，可导出Prometheus格式
//!
//! ## 快速开始
//!
//! ```rust
//! use cuckoo_hashset::CuckooSet;
//!
//! let set = CuckooSet::new(4);
//! for fruit in ["apple", "banana", "orange", "grape", "mango"] {
//!     assert!(set.insert(fruit));
//! }
//!
//! assert!(set.contains("grape"));
//! assert!(set.remove("grape"));
//! assert!(!set.contains("grape"));
//!
//! println!("{:?}", set.stats());
//! ```

#![warn(clippy::all)]
#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        log::info!($($arg)*)
    };
}

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!($($arg)*)
    };
}

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!($($arg)*)
    };
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {};
}
// 核心模块导出
pub mod error;
pub mod types;
pub mod map;
pub mod memory;
pub mod hash;
pub mod stats;
pub mod version;

// 公共接口导出
pub use crate::{
    error::CuckooError,
    hash::{
        build_strategy, default_hash_strategy, DoubleHashStrategy, HashAlgorithm, HashStrategy,
    },
    map::{
        BackoffPolicy, CuckooSet, CuckooSetConfig, CuckooSetStats, RehashState, Table,
        DEFAULT_CONFIG,
    },
    memory::SlotArray,
    stats::{GlobalStatsRecorder, StatsRecorder, StatsRecorderFactory},
    types::{InsertOutcome, OperationType, TableSide},
    version::{GenerationGuard, GenerationTracker},
};

// 便捷功能函数

/// 批量插入，返回成功插入 (含已存在) 的键数量
pub fn batch_insert<'a>(set: &CuckooSet, keys: impl IntoIterator<Item = &'a str>) -> usize {
    keys.into_iter().filter(|key| set.insert(key)).count()
}

/// 批量查询
pub fn batch_contains<'a>(set: &CuckooSet, keys: impl IntoIterator<Item = &'a str>) -> Vec<bool> {
    keys.into_iter().map(|key| set.contains(key)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_helpers() {
        let set = CuckooSet::new(4);
        assert_eq!(batch_insert(&set, ["a", "b", "a"]), 3);
        assert_eq!(set.count(), 2);
        assert_eq!(batch_contains(&set, ["a", "z", "b"]), vec![true, false, true]);
    }
}
