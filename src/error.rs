//! 统一错误处理 - 所有可能错误类型和恢复逻辑

/// Cuckoo哈希集合可能发生的错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CuckooError {
    #[error("踢出次数超过预算 (预算: {max_kicks})")]
    KickBudgetExhausted {
        max_kicks: usize,
    },

    #[error("插入失败: 重试 {attempts} 次后仍无法容纳键 {key}")]
    InsertRetriesExhausted {
        key: String,
        attempts: usize,
    },

    #[error("扩容失败: 已翻倍 {doublings} 次仍无法重建 (最终大小: {size})")]
    RehashExhausted {
        doublings: u32,
        size: usize,
    },

    #[error("等待扩容完成超时 (等待次数: {attempts})")]
    RehashWaitExhausted {
        attempts: u32,
    },

    #[error("内存分配失败 (槽位数: {slots})")]
    AllocationFailed {
        slots: usize,
    },

    #[error("容量溢出 (当前大小: {size})")]
    CapacityOverflow {
        size: usize,
    },

    #[error("无效配置: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

impl CuckooError {
    /// 获取错误恢复建议
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::KickBudgetExhausted { .. } => Some("触发扩容后重试"),
            Self::InsertRetriesExhausted { .. } => Some("增大重试上限或降低并发写入压力"),
            Self::RehashExhausted { .. } => Some("使用不同的哈希算法"),
            Self::RehashWaitExhausted { .. } => Some("增加等待次数或最大退避时间"),
            Self::AllocationFailed { .. } => Some("检查系统内存或减小表大小"),
            Self::CapacityOverflow { .. } => None,
            Self::InvalidConfig { .. } => Some("检查配置参数"),
        }
    }

    /// 判断错误是否可恢复
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::AllocationFailed { .. } | Self::CapacityOverflow { .. } | Self::InvalidConfig { .. }
        )
    }

    /// 是否需要操作重试
    pub fn should_retry(&self) -> bool {
        matches!(
            self,
            Self::KickBudgetExhausted { .. } | Self::RehashWaitExhausted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let kick = CuckooError::KickBudgetExhausted { max_kicks: 8 };
        assert!(kick.should_retry());
        assert!(kick.is_recoverable());

        let oom = CuckooError::AllocationFailed { slots: 1 << 40 };
        assert!(!oom.is_recoverable());
        assert!(!oom.should_retry());
        assert!(oom.recovery_suggestion().is_some());
    }

    #[test]
    fn test_error_display() {
        let err = CuckooError::InsertRetriesExhausted {
            key: "apple".into(),
            attempts: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("apple"));
        assert!(msg.contains('3'));
    }
}
