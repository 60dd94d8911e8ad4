//! 内存管理模块 - 槽位存储

pub mod slot;

pub use slot::SlotArray;
