//! 集合核心模块 - 实现Cuckoo哈希集合及其组件

pub mod table;
pub mod rehash;
pub mod cuckoo_set;

pub use table::{Displacement, DisplacementReport, Table};
pub use rehash::{rebuild, BackoffPolicy, Rebuilt, RehashGate, RehashState, RehashToken};
pub use cuckoo_set::{CuckooSet, CuckooSetConfig, CuckooSetStats};

use once_cell::sync::Lazy;

/// 全局默认配置
pub static DEFAULT_CONFIG: Lazy<CuckooSetConfig> = Lazy::new(CuckooSetConfig::default);
