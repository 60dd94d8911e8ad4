//! 代际跟踪器 - 记录已发布的表代数

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

/// 代际保护器 - 记录操作开始时观察到的代数
#[derive(Debug, Clone, Copy)]
pub struct GenerationGuard {
    generation: u64,
    start_time: Instant,
}

impl GenerationGuard {
    /// 获取开始时的代数
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 获取操作已耗时
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// 代际跟踪器
///
/// 每次发布新表时代数加一。
#[derive(Debug, Default)]
pub struct GenerationTracker {
    generation: AtomicU64,
}

impl GenerationTracker {
    /// 创建新跟踪器，初始代数为0
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前代数
    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// 开始一个新操作
    pub fn begin_operation(&self) -> GenerationGuard {
        GenerationGuard {
            generation: self.current(),
            start_time: Instant::now(),
        }
    }

    /// 操作期间是否没有发布新代
    pub fn is_current(&self, guard: &GenerationGuard) -> bool {
        guard.generation == self.current()
    }

    /// 发布新代，返回新代数
    pub fn advance(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }
}
