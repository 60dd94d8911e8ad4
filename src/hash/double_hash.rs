//! 双哈希策略 - 使用两个独立哈希函数分别定位A、B数组槽位

use crate::{
    hash::strategy::{HashAlgorithm, HashStrategy, HasherFunction},
    types::TableSide,
};
use ahash::RandomState;
use std::{
    fmt,
    hash::{BuildHasher, Hasher},
    sync::Arc,
};

const PRIMARY_SEED: u64 = 42;
const SECONDARY_SEED: u64 = 123;

/// 双哈希策略
#[derive(Clone)]
pub struct DoubleHashStrategy {
    primary_hasher: Arc<dyn HasherFunction>,
    secondary_hasher: Arc<dyn HasherFunction>,
    algorithm: Option<HashAlgorithm>,
}

impl DoubleHashStrategy {
    /// 创建新双哈希策略
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let (primary_hasher, secondary_hasher) = Self::build_hasher_functions(algorithm);
        Self {
            primary_hasher,
            secondary_hasher,
            algorithm: Some(algorithm),
        }
    }

    /// 使用自定义哈希函数创建
    pub fn from_functions<P, S>(primary: P, secondary: S) -> Self
    where
        P: Fn(&[u8]) -> u64 + Send + Sync + 'static,
        S: Fn(&[u8]) -> u64 + Send + Sync + 'static,
    {
        Self {
            primary_hasher: Arc::new(primary),
            secondary_hasher: Arc::new(secondary),
            algorithm: None,
        }
    }

    /// 构建哈希函数对
    fn build_hasher_functions(
        algorithm: HashAlgorithm,
    ) -> (Arc<dyn HasherFunction>, Arc<dyn HasherFunction>) {
        match algorithm {
            HashAlgorithm::XxHash => (
                Arc::new(|data: &[u8]| {
                    let mut hasher = twox_hash::XxHash32::with_seed(PRIMARY_SEED as u32);
                    hasher.write(data);
                    hasher.finish()
                }),
                Arc::new(|data: &[u8]| {
                    let mut hasher = twox_hash::XxHash64::with_seed(SECONDARY_SEED);
                    hasher.write(data);
                    hasher.finish()
                }),
            ),
            HashAlgorithm::AHash => (
                Self::ahash_function(PRIMARY_SEED),
                Self::ahash_function(SECONDARY_SEED),
            ),
            HashAlgorithm::Default => (
                Self::sip_function(PRIMARY_SEED),
                Self::sip_function(SECONDARY_SEED),
            ),
        }
    }

    fn ahash_function(seed: u64) -> Arc<dyn HasherFunction> {
        let state = RandomState::with_seed(seed as usize);
        Arc::new(move |data: &[u8]| {
            let mut hasher = state.build_hasher();
            hasher.write(data);
            hasher.finish()
        })
    }

    fn sip_function(seed: u64) -> Arc<dyn HasherFunction> {
        Arc::new(move |data: &[u8]| {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            hasher.write_u64(seed);
            hasher.write(data);
            hasher.finish()
        })
    }
}

impl Default for DoubleHashStrategy {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}

impl fmt::Debug for DoubleHashStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoubleHashStrategy")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl HashStrategy for DoubleHashStrategy {
    fn hash(&self, side: TableSide, key: &[u8]) -> u64 {
        match side {
            TableSide::A => self.primary_hasher.hash_bytes(key),
            TableSide::B => self.secondary_hasher.hash_bytes(key),
        }
    }

    fn algorithm(&self) -> Option<HashAlgorithm> {
        self.algorithm
    }
}
