//! 哈希模块 - 统一管理哈希相关功能

pub mod strategy;
pub mod double_hash;

pub use strategy::{build_strategy, HashAlgorithm, HashStrategy, HasherFunction};
pub use double_hash::DoubleHashStrategy;

use std::sync::Arc;

/// 默认哈希策略
pub fn default_hash_strategy() -> Arc<dyn HashStrategy> {
    build_strategy(HashAlgorithm::default())
}
