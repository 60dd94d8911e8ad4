//! 代际模块 - 跟踪已发布的表代数

pub mod tracker;

pub use tracker::{GenerationGuard, GenerationTracker};
