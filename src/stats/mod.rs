//! 统计模块 - 统一管理集合运行指标

pub mod recorder;
pub mod operation;
pub mod rehash;

pub use recorder::{DisabledStatsRecorder, GlobalStatsRecorder, StatsRecorder, StatsRecorderFactory};
pub use operation::{AtomicOperationStats, OperationRecorder, OperationStatsSnapshot};
pub use rehash::{RehashAccumulatedSnapshot, RehashRecorder, RehashSnapshot, RehashStats};
