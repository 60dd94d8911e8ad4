//! 哈希策略模块 - 定义槽位定位策略

use crate::types::TableSide;
use std::sync::Arc;

use super::DoubleHashStrategy;

/// 哈希算法选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    /// A侧 xxHash32，B侧 xxHash64
    #[default]
    XxHash,
    /// 两个不同种子的 aHash
    AHash,
    /// 标准库 SipHash，两个不同种子
    Default,
}

/// 哈希策略特征
///
/// `position` 对同一 `(key, size)` 必须是确定的，`contains` 依赖这一点
/// 直接计算两个候选槽位而无需搜索。
pub trait HashStrategy: Send + Sync {
    /// 计算键在指定数组一侧的原始哈希值
    fn hash(&self, side: TableSide, key: &[u8]) -> u64;

    /// 键在指定数组中的槽位下标
    fn position(&self, side: TableSide, key: &str, size: usize) -> usize {
        (self.hash(side, key.as_bytes()) % size as u64) as usize
    }

    /// 两个候选槽位 (A侧, B侧)
    fn positions(&self, key: &str, size: usize) -> (usize, usize) {
        (
            self.position(TableSide::A, key, size),
            self.position(TableSide::B, key, size),
        )
    }

    /// 使用的算法；自定义哈希函数返回 `None`
    fn algorithm(&self) -> Option<HashAlgorithm>;
}

/// 哈希函数特征
pub trait HasherFunction: Send + Sync {
    fn hash_bytes(&self, data: &[u8]) -> u64;
}

impl<T> HasherFunction for T
where
    T: Fn(&[u8]) -> u64 + Send + Sync,
{
    fn hash_bytes(&self, data: &[u8]) -> u64 {
        self(data)
    }
}

/// 按算法构建共享哈希策略
pub fn build_strategy(algorithm: HashAlgorithm) -> Arc<dyn HashStrategy> {
    Arc::new(DoubleHashStrategy::new(algorithm))
}
