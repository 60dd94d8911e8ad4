//! 单代存储表 - 两个槽位数组、踢出搜索与路径回滚

use crate::{
    error::CuckooError,
    hash::HashStrategy,
    memory::SlotArray,
    types::TableSide,
};
use std::{fmt, sync::Arc};

/// 一次踢出中的单步交换记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Displacement {
    /// 本步放入槽位的键
    pub key: String,
    pub side: TableSide,
    pub index: usize,
}

/// 踢出成功后的报告
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplacementReport {
    /// 被挤出原槽位的键数量
    pub kicks: usize,
}

/// 某一容量下的存储表
///
/// 不变式:
/// - `count` 等于两个数组中非空槽位之和
/// - 同一个键不会同时出现在两个数组中，也不会在一个数组中出现两次
/// - 驻留键的下标总是等于该数组哈希函数对它的计算结果
pub struct Table {
    slots_a: SlotArray,
    slots_b: SlotArray,
    size: usize,
    max_kicks: usize,
    count: usize,
    hasher: Arc<dyn HashStrategy>,
}

impl Table {
    /// 创建空表，踢出预算为 `kick_budget_factor * size`
    pub fn new(size: usize, kick_budget_factor: usize, hasher: Arc<dyn HashStrategy>) -> Self {
        let size = size.max(1);
        Self {
            slots_a: SlotArray::new(size),
            slots_b: SlotArray::new(size),
            size,
            max_kicks: kick_budget_factor.saturating_mul(size),
            count: 0,
            hasher,
        }
    }

    /// 创建空表，分配失败时返回 `AllocationFailed`
    pub fn try_new(
        size: usize,
        kick_budget_factor: usize,
        hasher: Arc<dyn HashStrategy>,
    ) -> Result<Self, CuckooError> {
        let size = size.max(1);
        Ok(Self {
            slots_a: SlotArray::try_new(size)?,
            slots_b: SlotArray::try_new(size)?,
            size,
            max_kicks: kick_budget_factor.saturating_mul(size),
            count: 0,
            hasher,
        })
    }

    /// 使用显式踢出预算创建空表
    pub fn with_kick_budget(size: usize, max_kicks: usize, hasher: Arc<dyn HashStrategy>) -> Self {
        let mut table = Self::new(size, 0, hasher);
        table.max_kicks = max_kicks;
        table
    }

    /// 每个数组的槽位数
    pub fn size(&self) -> usize {
        self.size
    }

    /// 总容量 (两个数组之和)
    pub fn capacity(&self) -> usize {
        self.size * 2
    }

    pub fn max_kicks(&self) -> usize {
        self.max_kicks
    }

    /// 当前驻留键数量
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn load_factor(&self) -> f64 {
        self.count as f64 / self.capacity() as f64
    }

    pub fn hasher(&self) -> &Arc<dyn HashStrategy> {
        &self.hasher
    }

    /// 只读访问一侧槽位数组
    pub fn slots(&self, side: TableSide) -> &SlotArray {
        match side {
            TableSide::A => &self.slots_a,
            TableSide::B => &self.slots_b,
        }
    }

    fn slots_mut(&mut self, side: TableSide) -> &mut SlotArray {
        match side {
            TableSide::A => &mut self.slots_a,
            TableSide::B => &mut self.slots_b,
        }
    }

    /// 键在指定一侧的槽位下标
    pub fn position(&self, side: TableSide, key: &str) -> usize {
        self.hasher.position(side, key, self.size)
    }

    /// 定位驻留键
    pub fn locate(&self, key: &str) -> Option<(TableSide, usize)> {
        [TableSide::A, TableSide::B].into_iter().find_map(|side| {
            let index = self.position(side, key);
            self.slots(side).holds(index, key).then_some((side, index))
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.locate(key).is_some()
    }

    /// 删除键，键不存在时返回 `false`
    pub fn remove(&mut self, key: &str) -> bool {
        match self.locate(key) {
            Some((side, index)) => {
                self.slots_mut(side).take(index);
                self.count -= 1;
                true
            }
            None => false,
        }
    }

    /// 踢出搜索
    ///
    /// 反复把"无家可归"的键换入它在A侧、B侧的位置，被挤出的键成为新的无家可归者，
    /// 直到挤出空槽位。超过 `max_kicks` 轮后按记录的路径逆序回滚，表内容与调用前完全一致。
    ///
    /// 调用方需保证 `key` 尚未驻留。
    pub fn displace(&mut self, key: &str) -> Result<DisplacementReport, CuckooError> {
        let mut path: Vec<Displacement> = Vec::with_capacity(self.max_kicks.saturating_mul(2));
        let mut homeless = key.to_owned();

        for _ in 0..self.max_kicks {
            for side in [TableSide::A, TableSide::B] {
                let index = self.position(side, &homeless);
                path.push(Displacement {
                    key: homeless.clone(),
                    side,
                    index,
                });
                match self.slots_mut(side).swap(index, Some(homeless)) {
                    None => {
                        self.count += 1;
                        return Ok(DisplacementReport {
                            kicks: path.len() - 1,
                        });
                    }
                    Some(evicted) => homeless = evicted,
                }
            }
        }

        log_debug!(
            "displacement for {:?} exhausted {} kicks at size {}, rolling back {} steps",
            key,
            self.max_kicks,
            self.size,
            path.len()
        );
        let restored = self.rollback(&path, homeless);
        debug_assert_eq!(restored.as_deref(), Some(key));
        Err(CuckooError::KickBudgetExhausted {
            max_kicks: self.max_kicks,
        })
    }

    /// 按逆序撤销踢出路径，返回最初被插入的键
    ///
    /// `homeless` 是失败时仍无处安放的键，也就是最后一步挤出的占用者。
    pub(crate) fn rollback(&mut self, path: &[Displacement], homeless: String) -> Option<String> {
        let mut restore = Some(homeless);
        for step in path.iter().rev() {
            let placed = self.slots_mut(step.side).swap(step.index, restore.take());
            debug_assert_eq!(placed.as_deref(), Some(step.key.as_str()));
            restore = placed;
        }
        restore
    }

    /// 快照所有驻留键 (先A后B，下标升序)
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.count);
        for side in [TableSide::A, TableSide::B] {
            keys.extend(self.slots(side).iter_occupied().map(|(_, key)| key.to_owned()));
        }
        keys
    }

    /// 直接扫描两个数组统计非空槽位
    pub fn scan_count(&self) -> usize {
        self.slots_a.occupied() + self.slots_b.occupied()
    }

    /// 检查所有驻留键都位于各自哈希位置
    pub fn positions_consistent(&self) -> bool {
        [TableSide::A, TableSide::B].into_iter().all(|side| {
            self.slots(side)
                .iter_occupied()
                .all(|(index, key)| self.position(side, key) == index)
        })
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("size", &self.size)
            .field("count", &self.count)
            .field("max_kicks", &self.max_kicks)
            .field("load_factor", &self.load_factor())
            .finish()
    }
}
