// src/memory/slot.rs
//! 槽位数组 - 固定容量、按下标寻址的键槽

use crate::error::CuckooError;

/// 固定长度的槽位数组
///
/// 每个槽位为空或恰好保存一个键。键的归属完全由下标决定，
/// 数组创建后长度不再变化。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotArray {
    slots: Vec<Option<String>>,
}

impl SlotArray {
    /// 创建空槽位数组
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    /// 创建空槽位数组，分配失败时返回错误而不是中止进程
    pub fn try_new(len: usize) -> Result<Self, CuckooError> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(len)
            .map_err(|_| CuckooError::AllocationFailed { slots: len })?;
        slots.resize(len, None);
        Ok(Self { slots })
    }

    /// 槽位数量
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 读取槽位
    pub fn get(&self, index: usize) -> Option<&str> {
        self.slots.get(index).and_then(|slot| slot.as_deref())
    }

    /// 槽位是否保存了指定键
    pub fn holds(&self, index: usize, key: &str) -> bool {
        self.get(index) == Some(key)
    }

    /// 用 `incoming` 替换槽位内容，返回原占用者
    pub fn swap(&mut self, index: usize, incoming: Option<String>) -> Option<String> {
        std::mem::replace(&mut self.slots[index], incoming)
    }

    /// 清空槽位，返回原占用者
    pub fn take(&mut self, index: usize) -> Option<String> {
        self.slots[index].take()
    }

    /// 非空槽位数量 (直接扫描)
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// 按下标升序遍历非空槽位
    pub fn iter_occupied(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_deref().map(|key| (index, key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_and_take() {
        let mut slots = SlotArray::new(4);
        assert_eq!(slots.len(), 4);
        assert_eq!(slots.occupied(), 0);

        assert_eq!(slots.swap(2, Some("a".into())), None);
        assert!(slots.holds(2, "a"));
        assert_eq!(slots.swap(2, Some("b".into())), Some("a".into()));
        assert_eq!(slots.occupied(), 1);

        assert_eq!(slots.take(2), Some("b".into()));
        assert_eq!(slots.get(2), None);
        assert_eq!(slots.occupied(), 0);
    }

    #[test]
    fn test_try_new_huge_fails() {
        let err = SlotArray::try_new(usize::MAX).unwrap_err();
        assert_eq!(err, CuckooError::AllocationFailed { slots: usize::MAX });
    }

    #[test]
    fn test_iter_occupied_order() {
        let mut slots = SlotArray::try_new(5).unwrap();
        slots.swap(4, Some("z".into()));
        slots.swap(1, Some("y".into()));
        let seen: Vec<_> = slots.iter_occupied().collect();
        assert_eq!(seen, vec![(1, "y"), (4, "z")]);
    }
}
