//! 扩容协议 - 单写者扩容令牌、有界等待与离线重建

use crate::{
    error::CuckooError,
    hash::HashStrategy,
    map::{cuckoo_set::CuckooSetConfig, table::Table},
};
use parking_lot::{Condvar, Mutex};
use std::{
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

/// 扩容状态
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RehashState {
    /// 无扩容
    Idle = 0,
    /// 收集旧表中的全部键
    Snapshotting = 1,
    /// 在私有新表中重新插入
    Rebuilding = 2,
    /// 替换当前表
    Publishing = 3,
}

impl RehashState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Snapshotting,
            2 => Self::Rebuilding,
            3 => Self::Publishing,
            _ => Self::Idle,
        }
    }

    /// 是否有扩容正在进行
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Snapshotting)
                | (Self::Snapshotting, Self::Rebuilding)
                | (Self::Rebuilding, Self::Publishing)
                | (Self::Snapshotting, Self::Idle)
                | (Self::Rebuilding, Self::Idle)
                | (Self::Publishing, Self::Idle)
        )
    }
}

/// 等待扩容完成时的退避策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// 首次等待时长，之后每次翻倍
    pub initial: Duration,
    /// 单次等待上限
    pub max: Duration,
    /// 放弃前的最大等待次数
    pub max_attempts: u32,
}

/// 扩容闸门
///
/// 原子状态字保证同一时刻只有一个扩容者；等待者在条件变量上休眠，
/// 扩容结束时统一唤醒。
#[derive(Debug)]
pub struct RehashGate {
    state: AtomicU8,
    lock: Mutex<()>,
    idle: Condvar,
}

impl Default for RehashGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RehashGate {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(RehashState::Idle as u8),
            lock: Mutex::new(()),
            idle: Condvar::new(),
        }
    }

    pub fn state(&self) -> RehashState {
        RehashState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// 尝试成为唯一的扩容者
    pub fn try_begin(&self) -> Option<RehashToken<'_>> {
        self.state
            .compare_exchange(
                RehashState::Idle as u8,
                RehashState::Snapshotting as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .ok()
            .map(|_| {
                log_debug!("worker {:?} rehash gate acquired", thread::current().id());
                RehashToken { gate: self }
            })
    }

    /// 阻塞直到没有扩容在进行，返回等待次数
    ///
    /// 等待时长从 `initial` 开始翻倍，超过 `max_attempts` 次返回 `RehashWaitExhausted`。
    pub fn wait_idle(&self, policy: &BackoffPolicy) -> Result<u32, CuckooError> {
        if !self.is_active() {
            return Ok(0);
        }

        let mut timeout = policy.initial;
        let mut guard = self.lock.lock();
        for attempt in 0..policy.max_attempts {
            if !self.is_active() {
                return Ok(attempt);
            }
            self.idle.wait_for(&mut guard, timeout);
            timeout = timeout.saturating_mul(2).min(policy.max);
        }
        if !self.is_active() {
            return Ok(policy.max_attempts);
        }

        log_warn!(
            "worker {:?} gave up waiting for rehash after {} attempts",
            thread::current().id(),
            policy.max_attempts
        );
        Err(CuckooError::RehashWaitExhausted {
            attempts: policy.max_attempts,
        })
    }
}

/// 扩容令牌，释放时闸门回到 `Idle` 并唤醒等待者
#[derive(Debug)]
pub struct RehashToken<'a> {
    gate: &'a RehashGate,
}

impl RehashToken<'_> {
    /// 推进扩容状态
    pub fn advance(&self, next: RehashState) {
        let current = self.gate.state();
        debug_assert!(current.can_transition_to(next), "{:?} -> {:?}", current, next);
        self.gate.state.store(next as u8, Ordering::SeqCst);
        log_debug!("worker {:?} rehash {:?} -> {:?}", thread::current().id(), current, next);
    }
}

impl Drop for RehashToken<'_> {
    fn drop(&mut self) {
        let _guard = self.gate.lock.lock();
        self.gate
            .state
            .store(RehashState::Idle as u8, Ordering::SeqCst);
        self.gate.idle.notify_all();
    }
}

/// 重建结果
#[derive(Debug)]
pub struct Rebuilt {
    pub table: Table,
    /// 重建尝试次数 (含成功的那一次)
    pub attempts: u32,
}

fn double(size: usize) -> Result<usize, CuckooError> {
    size.checked_mul(2)
        .ok_or(CuckooError::CapacityOverflow { size })
}

/// `count` 个键放入每侧 `size` 槽位后负载因子是否低于阈值
fn fits_below(count: usize, size: usize, threshold: f64) -> bool {
    (count as f64) / (size.saturating_mul(2) as f64) < threshold
}

/// 把快照中的键按顺序重新插入更大的私有新表
///
/// 新表大小从 `prior_size` 的两倍开始，负载因子不低于阈值时继续翻倍；
/// 任何一个键踢出失败都会丢弃整张新表并再次翻倍重试。
pub fn rebuild(
    keys: &[String],
    prior_size: usize,
    config: &CuckooSetConfig,
    hasher: &Arc<dyn HashStrategy>,
) -> Result<Rebuilt, CuckooError> {
    let mut size = double(prior_size.max(1))?;

    for attempt in 1..=config.max_rehash_doublings {
        while !fits_below(keys.len(), size, config.rehash_load_factor) {
            size = double(size)?;
        }

        let mut scratch = Table::try_new(size, config.kick_budget_factor, Arc::clone(hasher))?;
        match keys.iter().try_for_each(|key| scratch.displace(key).map(drop)) {
            Ok(()) => {
                log_debug!(
                    "rebuilt {} keys into size {} on attempt {}",
                    keys.len(),
                    size,
                    attempt
                );
                return Ok(Rebuilt {
                    table: scratch,
                    attempts: attempt,
                });
            }
            Err(err) => {
                log_warn!(
                    "rebuild attempt {} at size {} failed: {}, doubling",
                    attempt,
                    size,
                    err
                );
            }
        }
        size = double(size)?;
    }

    log_error!(
        "rebuild of {} keys failed after {} doublings",
        keys.len(),
        config.max_rehash_doublings
    );
    Err(CuckooError::RehashExhausted {
        doublings: config.max_rehash_doublings,
        size,
    })
}
